//! Prelude module for the relkit library
//!
//! Re-exports the most commonly used items so typical integrations need a
//! single `use relkit::prelude::*;`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use relkit::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let storage = Arc::new(LocalStorage::new("./downloads")?);
//! let store = ManifestStore::at_default_key(storage.clone());
//! let (manifest, _etag) = store.load().await?;
//! println!("latest release: {}", manifest.latest);
//! # Ok(())
//! # }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components
pub use crate::app::{
    ArtifactInfo,
    DownloadCheck,
    DownloadChecker,
    LocalStorage,
    Manifest,
    ManifestStore,
    Md5Hash,
    MemoryStorage,
    Platform,
    PlatformArtifact,
    PlatformCatalog,
    PublishOutcome,
    PublishRequest,
    Publisher,
    PublisherConfig,
    ReleaseTrack,
    Storage,
    SweepOutcome,
    Sweeper,
    SweeperConfig,
    ValidatorConfig,
    VersionEntry,
    Violation,
};

// Validation entry point
pub use crate::app::manifest::validator::validate;

// Configuration
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_DOWNLOADS_HOST, DEFAULT_TRANSFER_CONCURRENCY, MANIFEST_KEY};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _catalog = PlatformCatalog::default();
        let _config = PublisherConfig::default();
        let _sweeper_config = SweeperConfig::default();
        let _app_config = AppConfig::default();

        assert_eq!(MANIFEST_KEY, "manifest.json");
        assert_eq!(DEFAULT_TRANSFER_CONCURRENCY, 5);
    }

    #[tokio::test]
    async fn test_prelude_integration_pattern() {
        // The common integration pattern works with prelude imports alone
        let storage = Arc::new(MemoryStorage::new());
        let store = ManifestStore::at_default_key(storage);

        let manifest = Manifest::initial("1.0.0");
        store
            .save(&manifest, crate::app::WritePrecondition::IfAbsent)
            .await
            .unwrap();

        let (loaded, _etag) = store.load().await.unwrap();
        assert_eq!(loaded.latest, "1.0.0");
    }
}
