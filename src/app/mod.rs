//! Core application logic for relkit
//!
//! This module contains the release pipeline components: the manifest model
//! and its store, the publisher and beta-expiry sweeper that mutate it, the
//! validator and differ that read it, the storage abstraction underneath,
//! and the download checker that verifies published artifacts end to end.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use relkit::app::manifest::{ManifestStore, Platform, ReleaseTrack};
//! use relkit::app::publisher::{Publisher, PublisherConfig, PublishRequest};
//! use relkit::app::storage::LocalStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Arc::new(LocalStorage::new("./downloads")?);
//! let store = ManifestStore::at_default_key(storage.clone());
//! let publisher = Publisher::new(store, storage, PublisherConfig::default());
//!
//! let mut artifacts = BTreeMap::new();
//! artifacts.insert(Platform::Windows, "dist/app.exe".into());
//!
//! let request = PublishRequest {
//!     version: "1.2.3".to_string(),
//!     artifacts,
//!     notes: "Bug fixes".to_string(),
//!     critical: false,
//!     track: ReleaseTrack::Stable,
//! };
//! let outcome = publisher
//!     .publish(&request, chrono::Local::now().date_naive())
//!     .await?;
//! println!("latest is now {}", outcome.manifest.latest);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod checker;
pub mod hash;
pub mod manifest;
pub mod probe;
pub mod publisher;
pub mod storage;
pub mod sweeper;
pub mod version;

// Re-export main public API
pub use catalog::{PlatformCatalog, PlatformSpec};
pub use checker::{DownloadCheck, DownloadChecker};
pub use hash::Md5Hash;
pub use manifest::{
    Manifest, ManifestStore, Platform, PlatformArtifact, ReleaseTrack, ValidatorConfig,
    VersionEntry, Violation,
};
pub use probe::{probe, ArtifactInfo};
pub use publisher::{PublishOutcome, PublishRequest, Publisher, PublisherConfig};
pub use storage::{LocalStorage, MemoryStorage, PutOptions, Storage, WritePrecondition};
pub use sweeper::{SweepOutcome, Sweeper, SweeperConfig};
