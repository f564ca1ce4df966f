//! Beta expiry sweeping
//!
//! Scans the beta track for entries whose expiry date has passed, deletes
//! their backing artifact objects, removes them from the manifest and
//! repoints `latest_beta`. The manifest is written exactly once at the end
//! of a sweep so readers never observe a half-removed state, and the whole
//! cycle retries under the conditional-write protocol when another writer
//! races it.
//!
//! An entry whose `expires` field does not parse is left alone with a
//! warning; the validator reports it, and a sweep must not abort or guess
//! on one bad record.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::app::manifest::model::version_prefix;
use crate::app::manifest::store::ManifestStore;
use crate::app::storage::{Storage, WritePrecondition};
use crate::constants::transfer::{DEFAULT_TRANSFER_CONCURRENCY, MANIFEST_WRITE_ATTEMPTS};
use crate::errors::{ManifestError, StorageError, SweepError, SweepResult};

/// Sweeper tuning
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Bound on concurrent artifact deletes
    pub transfer_concurrency: usize,
    /// Attempts at the conditional manifest write
    pub write_attempts: u32,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            transfer_concurrency: DEFAULT_TRANSFER_CONCURRENCY,
            write_attempts: MANIFEST_WRITE_ATTEMPTS,
        }
    }
}

/// What a sweep did (or would do, for a dry run)
#[derive(Debug, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Beta versions removed (or marked for removal in a dry run)
    pub removed: Vec<String>,
    /// Whether the manifest was actually rewritten
    pub manifest_updated: bool,
}

/// Removes expired beta releases and their artifacts
pub struct Sweeper {
    store: ManifestStore,
    storage: Arc<dyn Storage>,
    config: SweeperConfig,
}

impl Sweeper {
    pub fn new(store: ManifestStore, storage: Arc<dyn Storage>, config: SweeperConfig) -> Self {
        Self {
            store,
            storage,
            config,
        }
    }

    /// Sweep betas that expired strictly before `today`
    pub async fn sweep(&self, today: NaiveDate, dry_run: bool) -> SweepResult<SweepOutcome> {
        for attempt in 1..=self.config.write_attempts {
            let (mut manifest, etag) = self.store.load().await?;

            let expired = Self::expired_versions(&manifest, today);
            if expired.is_empty() {
                info!("no expired beta releases found");
                return Ok(SweepOutcome {
                    removed: Vec::new(),
                    manifest_updated: false,
                });
            }

            if dry_run {
                for version in &expired {
                    println!("Would delete beta version {} and all associated files", version);
                }
                return Ok(SweepOutcome {
                    removed: expired,
                    manifest_updated: false,
                });
            }

            for version in &expired {
                self.delete_artifacts(version).await;
                manifest.remove_beta(version);
            }

            if let Some(latest_beta) = manifest.latest_beta.clone() {
                if expired.contains(&latest_beta) {
                    manifest.recompute_latest_beta();
                    info!(
                        latest_beta = manifest.latest_beta.as_deref().unwrap_or("<none>"),
                        "repointed latest_beta after sweep"
                    );
                }
            }

            match self
                .store
                .save(&manifest, WritePrecondition::IfMatch(etag))
                .await
            {
                Ok(_) => {
                    info!(removed = expired.len(), "sweep complete");
                    return Ok(SweepOutcome {
                        removed: expired,
                        manifest_updated: true,
                    });
                }
                Err(ManifestError::Storage(StorageError::PreconditionFailed { .. })) => {
                    warn!(attempt, "manifest changed concurrently, retrying sweep cycle");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SweepError::Contention {
            attempts: self.config.write_attempts,
        })
    }

    /// Beta versions whose expiry date lies strictly before `today`
    fn expired_versions(manifest: &crate::app::manifest::model::Manifest, today: NaiveDate) -> Vec<String> {
        let mut expired = Vec::new();
        for (version, entry) in &manifest.beta {
            match entry.expiry_date() {
                Some(expiry) if expiry < today => {
                    println!("Found expired beta: {} (expired on {})", version, expiry);
                    expired.push(version.clone());
                }
                Some(_) => {}
                None => {
                    warn!(
                        version = %version,
                        expires = entry.expires.as_deref().unwrap_or("<missing>"),
                        "beta entry has unusable expiry date, leaving in place"
                    );
                }
            }
        }
        expired
    }

    /// Delete every artifact object under a beta version's prefix,
    /// best-effort per object
    async fn delete_artifacts(&self, version: &str) {
        let prefix = version_prefix(true, version);
        let keys = match self.storage.list_by_prefix(&prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(prefix = %prefix, error = %e, "failed to list artifacts, skipping deletes");
                return;
            }
        };

        stream::iter(keys)
            .map(|key| {
                let storage = self.storage.clone();
                async move {
                    println!("Deleting {}...", key);
                    if let Err(e) = storage.delete(&key).await {
                        warn!(key = %key, error = %e, "artifact delete failed");
                    }
                }
            })
            .buffer_unordered(self.config.transfer_concurrency.max(1))
            .collect::<Vec<()>>()
            .await;
    }
}
