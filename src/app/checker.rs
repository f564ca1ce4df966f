//! Download integrity checking
//!
//! Fetches the published manifest over HTTP, downloads every recorded
//! installer and recomputes its checksum against what the manifest promises.
//! This is the consumer-side proof that what the publisher uploaded is what
//! users actually receive, run after releases and from CI.
//!
//! Downloads run through a small bounded pool; a failure on one artifact is
//! reported and never cancels the others.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::debug;

use crate::app::hash::Md5Hash;
use crate::app::manifest::model::{Manifest, Platform, VersionEntry};
use crate::constants::transfer::DEFAULT_TRANSFER_CONCURRENCY;
use crate::errors::{CheckError, CheckResult};

/// Outcome of checking one download
#[derive(Debug, Clone, Serialize)]
pub struct DownloadCheck {
    pub version: String,
    pub platform: Platform,
    pub url: String,
    pub valid: bool,
    pub message: String,
}

/// Compare downloaded bytes against the checksum the manifest records
///
/// An unparseable recorded checksum counts as a failure too: the manifest
/// is promising something no download can satisfy.
pub fn verify_bytes(bytes: &[u8], recorded_checksum: &str) -> CheckResult<()> {
    let expected = Md5Hash::from_hex(recorded_checksum)?;

    let actual = Md5Hash::from(md5::compute(bytes));
    if actual == expected {
        Ok(())
    } else {
        Err(CheckError::ChecksumMismatch {
            expected: expected.to_hex(),
            actual: actual.to_hex(),
        })
    }
}

/// Select the versions a check run covers
///
/// With a filter, that one version (searching the beta track only when
/// `include_beta` is set); without one, every stable version plus, when
/// `include_beta` is set, every beta version.
pub fn versions_to_check(
    manifest: &Manifest,
    version_filter: Option<&str>,
    include_beta: bool,
) -> CheckResult<Vec<String>> {
    match version_filter {
        Some(version) => {
            if manifest.entry(version, include_beta).is_none() {
                return Err(CheckError::VersionNotFound {
                    version: version.to_string(),
                });
            }
            Ok(vec![version.to_string()])
        }
        None => {
            let mut versions: Vec<String> = manifest.versions.keys().cloned().collect();
            if include_beta {
                versions.extend(manifest.beta.keys().cloned());
            }
            Ok(versions)
        }
    }
}

/// Downloads artifacts and verifies their checksums
pub struct DownloadChecker {
    client: reqwest::Client,
    concurrency: usize,
}

impl DownloadChecker {
    /// Create a checker with the default transfer bound
    pub fn new() -> Self {
        Self::with_concurrency(DEFAULT_TRANSFER_CONCURRENCY)
    }

    /// Create a checker downloading at most `concurrency` artifacts at once
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch and parse the manifest from its public URL
    pub async fn fetch_manifest(&self, url: &str) -> CheckResult<Manifest> {
        debug!(url, "fetching manifest");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let manifest = response.json::<Manifest>().await?;
        Ok(manifest)
    }

    /// Check every artifact of one version entry
    pub async fn check_entry(&self, version: &str, entry: &VersionEntry) -> Vec<DownloadCheck> {
        stream::iter(entry.platforms.iter())
            .map(|(platform, artifact)| {
                let client = self.client.clone();
                let version = version.to_string();
                let platform = *platform;
                let url = artifact.url.clone();
                let checksum = artifact.checksum.clone();
                async move {
                    let outcome = match download(&client, &url).await {
                        Ok(bytes) => verify_bytes(&bytes, &checksum),
                        Err(e) => Err(e),
                    };
                    let (valid, message) = match outcome {
                        Ok(()) => (true, "OK".to_string()),
                        Err(e) => (false, e.to_string()),
                    };
                    DownloadCheck {
                        version,
                        platform,
                        url,
                        valid,
                        message,
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

impl Default for DownloadChecker {
    fn default() -> Self {
        Self::new()
    }
}

async fn download(client: &reqwest::Client, url: &str) -> CheckResult<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
