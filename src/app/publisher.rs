//! Release publishing
//!
//! Takes a version, a set of per-platform installer paths and release
//! metadata, and turns them into uploaded artifacts plus a new manifest
//! entry. Missing installer files are warned about and skipped, since
//! releases legitimately ship for a subset of platforms, but a publish
//! where no file resolves at all is refused.
//!
//! Artifact uploads run concurrently and best-effort: one platform failing
//! to upload never blocks the others or the manifest write. The manifest
//! itself is written exactly once per attempt, under an entity-tag
//! precondition, and the whole load-mutate-save cycle is retried when a
//! concurrent writer wins the race.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::app::catalog::PlatformCatalog;
use crate::app::manifest::model::{
    artifact_key, artifact_url, Manifest, Platform, PlatformArtifact, ReleaseTrack, VersionEntry,
};
use crate::app::manifest::store::ManifestStore;
use crate::app::probe::{probe, ArtifactInfo};
use crate::app::storage::{PutOptions, Storage, WritePrecondition};
use crate::app::version;
use crate::constants::dates::DATE_FORMAT;
use crate::constants::lifecycle::DEFAULT_BETA_EXPIRY_DAYS;
use crate::constants::transfer::{DEFAULT_TRANSFER_CONCURRENCY, MANIFEST_WRITE_ATTEMPTS};
use crate::errors::{ManifestError, ProbeError, PublishError, PublishResult, StorageError};

/// Everything a publish needs besides the storage handles
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Version being released
    pub version: String,
    /// Installer file per platform; missing files are skipped with a warning
    pub artifacts: BTreeMap<Platform, PathBuf>,
    /// Free-text release notes
    pub notes: String,
    /// Forces update prompts downstream
    pub critical: bool,
    /// Stable or beta, with the beta expiry carried in the track
    pub track: ReleaseTrack,
}

/// Publisher tuning
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Public host encoded into artifact URLs
    pub downloads_host: String,
    /// Per-platform capability table
    pub catalog: PlatformCatalog,
    /// Bound on concurrent artifact uploads
    pub transfer_concurrency: usize,
    /// Attempts at the conditional manifest write
    pub write_attempts: u32,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            downloads_host: crate::constants::DEFAULT_DOWNLOADS_HOST.to_string(),
            catalog: PlatformCatalog::default(),
            transfer_concurrency: DEFAULT_TRANSFER_CONCURRENCY,
            write_attempts: MANIFEST_WRITE_ATTEMPTS,
        }
    }
}

/// What a publish did
#[derive(Debug)]
pub struct PublishOutcome {
    /// Manifest as persisted
    pub manifest: Manifest,
    /// Platforms whose artifacts uploaded successfully
    pub uploaded: Vec<Platform>,
    /// Platforms whose uploads failed (entry still recorded)
    pub upload_failures: Vec<Platform>,
    /// Platforms skipped because their installer file was missing
    pub skipped: Vec<Platform>,
}

/// Resolve a caller-supplied beta expiry, or default to 30 days out
///
/// Fails with [`PublishError::InvalidDate`] when the supplied string is not
/// a YYYY-MM-DD calendar date.
pub fn resolve_beta_expiry(supplied: Option<&str>, today: NaiveDate) -> PublishResult<NaiveDate> {
    match supplied {
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
            PublishError::InvalidDate {
                value: raw.to_string(),
            }
        }),
        None => Ok(today + Duration::days(DEFAULT_BETA_EXPIRY_DAYS)),
    }
}

struct ResolvedArtifact {
    platform: Platform,
    path: PathBuf,
    filename: String,
    info: ArtifactInfo,
}

/// Publishes releases into the manifest and artifact storage
pub struct Publisher {
    store: ManifestStore,
    storage: Arc<dyn Storage>,
    config: PublisherConfig,
}

impl Publisher {
    pub fn new(store: ManifestStore, storage: Arc<dyn Storage>, config: PublisherConfig) -> Self {
        Self {
            store,
            storage,
            config,
        }
    }

    /// Publish a release dated `today`
    pub async fn publish(
        &self,
        request: &PublishRequest,
        today: NaiveDate,
    ) -> PublishResult<PublishOutcome> {
        let release_version = version::parse(&request.version)?;
        let is_beta = request.track.is_beta();

        let (resolved, skipped) = self.probe_artifacts(request).await;
        if resolved.is_empty() {
            return Err(PublishError::NoArtifacts);
        }

        let (uploaded, upload_failures) = self.upload_artifacts(request, &resolved).await;

        let entry = self.build_entry(request, &resolved, today);
        let manifest = self
            .write_manifest(request, &release_version, entry)
            .await?;

        info!(
            version = %request.version,
            beta = is_beta,
            platforms = resolved.len(),
            "published release"
        );

        Ok(PublishOutcome {
            manifest,
            uploaded,
            upload_failures,
            skipped,
        })
    }

    /// Probe every supplied installer, splitting resolved from missing
    async fn probe_artifacts(
        &self,
        request: &PublishRequest,
    ) -> (Vec<ResolvedArtifact>, Vec<Platform>) {
        let mut resolved = Vec::new();
        let mut skipped = Vec::new();

        for (platform, path) in &request.artifacts {
            match probe(path).await {
                Ok(info) => {
                    let filename = path
                        .file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_else(|| format!("{}-installer", platform));
                    resolved.push(ResolvedArtifact {
                        platform: *platform,
                        path: path.clone(),
                        filename,
                        info,
                    });
                }
                Err(ProbeError::NotFound { path }) => {
                    warn!(platform = %platform, path = %path.display(), "installer file not found, skipping platform");
                    skipped.push(*platform);
                }
                Err(e) => {
                    warn!(platform = %platform, error = %e, "failed to probe installer, skipping platform");
                    skipped.push(*platform);
                }
            }
        }

        (resolved, skipped)
    }

    /// Upload resolved artifacts concurrently, best-effort per platform
    async fn upload_artifacts(
        &self,
        request: &PublishRequest,
        resolved: &[ResolvedArtifact],
    ) -> (Vec<Platform>, Vec<Platform>) {
        let is_beta = request.track.is_beta();

        let results: Vec<(Platform, bool)> = stream::iter(resolved)
            .map(|artifact| {
                let storage = self.storage.clone();
                let key = artifact_key(
                    is_beta,
                    &request.version,
                    artifact.platform,
                    &artifact.filename,
                );
                let content_type = self
                    .config
                    .catalog
                    .spec(artifact.platform)
                    .map(|s| s.content_type.clone())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                async move {
                    let outcome = async {
                        let bytes = tokio::fs::read(&artifact.path).await?;
                        storage
                            .put(&key, bytes, PutOptions::artifact(&content_type, &artifact.filename))
                            .await
                            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
                        Ok::<(), std::io::Error>(())
                    }
                    .await;

                    match outcome {
                        Ok(()) => {
                            println!("Uploaded {} -> {}", artifact.path.display(), key);
                            (artifact.platform, true)
                        }
                        Err(e) => {
                            warn!(platform = %artifact.platform, error = %e, "artifact upload failed");
                            println!("Upload failed for {}: {}", artifact.platform, e);
                            (artifact.platform, false)
                        }
                    }
                }
            })
            .buffer_unordered(self.config.transfer_concurrency.max(1))
            .collect()
            .await;

        let uploaded = results.iter().filter(|(_, ok)| *ok).map(|(p, _)| *p).collect();
        let failed = results.iter().filter(|(_, ok)| !*ok).map(|(p, _)| *p).collect();
        (uploaded, failed)
    }

    /// Assemble the manifest entry for this release
    fn build_entry(
        &self,
        request: &PublishRequest,
        resolved: &[ResolvedArtifact],
        today: NaiveDate,
    ) -> VersionEntry {
        let is_beta = request.track.is_beta();
        let mut platforms = BTreeMap::new();

        for artifact in resolved {
            let spec = match self.config.catalog.spec(artifact.platform) {
                Some(spec) => spec,
                None => {
                    warn!(platform = %artifact.platform, "platform missing from capability catalog, skipping");
                    continue;
                }
            };

            platforms.insert(
                artifact.platform,
                PlatformArtifact {
                    version: request.version.clone(),
                    url: artifact_url(
                        &self.config.downloads_host,
                        is_beta,
                        &request.version,
                        artifact.platform,
                        &artifact.filename,
                    ),
                    checksum: artifact.info.checksum.to_hex(),
                    size: artifact.info.size,
                    min_os: spec.min_os.clone(),
                    architecture: spec.architecture.clone(),
                },
            );
        }

        let expires = match request.track {
            ReleaseTrack::Stable => None,
            ReleaseTrack::Beta { expires } => Some(expires.format(DATE_FORMAT).to_string()),
        };

        VersionEntry {
            release_date: today.format(DATE_FORMAT).to_string(),
            release_notes: request.notes.clone(),
            critical: request.critical,
            expires,
            platforms,
        }
    }

    /// Load-mutate-save with conditional-write retries
    async fn write_manifest(
        &self,
        request: &PublishRequest,
        release_version: &semver::Version,
        entry: VersionEntry,
    ) -> PublishResult<Manifest> {
        let is_beta = request.track.is_beta();

        for attempt in 1..=self.config.write_attempts {
            let (mut manifest, precondition) = match self.store.load().await {
                Ok((manifest, etag)) => (manifest, WritePrecondition::IfMatch(etag)),
                Err(ManifestError::NotFound { .. }) => {
                    (Manifest::initial(&request.version), WritePrecondition::IfAbsent)
                }
                Err(e) => return Err(e.into()),
            };

            if is_beta {
                let advance = match &manifest.latest_beta {
                    None => true,
                    Some(current) => version::supersedes(release_version, current),
                };
                if advance {
                    manifest.latest_beta = Some(request.version.clone());
                }
            } else if version::supersedes(release_version, &manifest.latest) {
                manifest.latest = request.version.clone();
            }

            // Republishing a version overwrites its entry silently
            manifest.insert(&request.version, entry.clone(), is_beta);

            match self.store.save(&manifest, precondition).await {
                Ok(_) => return Ok(manifest),
                Err(ManifestError::Storage(StorageError::PreconditionFailed { .. })) => {
                    warn!(attempt, "manifest changed concurrently, retrying publish cycle");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PublishError::Contention {
            attempts: self.config.write_attempts,
        })
    }
}
