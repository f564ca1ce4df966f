//! Manifest persistence
//!
//! Loads and saves the manifest document against a [`Storage`] backend. This
//! layer owns serialization only: a body that is not valid JSON is a
//! [`ManifestError::Parse`], but missing or semantically wrong fields pass
//! through untouched. Judging those is the validator's job.
//!
//! Every load returns the object's entity tag alongside the document, and
//! every save takes a write precondition, so mutators can run their whole
//! load-mutate-save cycle as a conditional write and retry on conflicts.

use std::sync::Arc;

use tracing::debug;

use super::model::Manifest;
use crate::app::storage::{PutOptions, Storage, WritePrecondition};
use crate::errors::{ManifestError, ManifestResult, StorageError};

/// Loads and saves the manifest at a fixed storage key
#[derive(Clone)]
pub struct ManifestStore {
    storage: Arc<dyn Storage>,
    key: String,
}

impl ManifestStore {
    /// Create a store for the given backend and manifest key
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Create a store at the conventional `manifest.json` key
    pub fn at_default_key(storage: Arc<dyn Storage>) -> Self {
        Self::new(storage, crate::constants::MANIFEST_KEY)
    }

    /// The storage key this store reads and writes
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load and parse the typed manifest, returning its entity tag
    pub async fn load(&self) -> ManifestResult<(Manifest, String)> {
        let object = self.fetch().await?;
        let manifest: Manifest = serde_json::from_slice(&object.bytes)?;
        debug!(key = %self.key, etag = %object.etag, "loaded manifest");
        Ok((manifest, object.etag))
    }

    /// Load the manifest as raw JSON for validation, returning its entity tag
    ///
    /// Only malformed JSON fails here; a document missing every required
    /// field still loads, so the validator can report on it.
    pub async fn load_value(&self) -> ManifestResult<(serde_json::Value, String)> {
        let object = self.fetch().await?;
        let value: serde_json::Value = serde_json::from_slice(&object.bytes)?;
        Ok((value, object.etag))
    }

    /// Serialize and persist the manifest with no-cache semantics
    ///
    /// `precondition` carries the etag from the load that produced this
    /// manifest (or `IfAbsent` for a first-ever write); a
    /// [`StorageError::PreconditionFailed`] means another writer got there
    /// first and the caller should redo its cycle.
    pub async fn save(
        &self,
        manifest: &Manifest,
        precondition: WritePrecondition,
    ) -> ManifestResult<String> {
        let bytes = serde_json::to_vec_pretty(manifest)?;
        let etag = self
            .storage
            .put(&self.key, bytes, PutOptions::manifest(precondition))
            .await?;
        debug!(key = %self.key, etag = %etag, "saved manifest");
        Ok(etag)
    }

    async fn fetch(&self) -> ManifestResult<crate::app::storage::StoredObject> {
        match self.storage.get(&self.key).await {
            Ok(object) => Ok(object),
            Err(StorageError::NotFound { .. }) => Err(ManifestError::NotFound {
                key: self.key.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::manifest::model::{Platform, PlatformArtifact, VersionEntry};
    use crate::app::storage::MemoryStorage;
    use std::collections::BTreeMap;

    fn sample_manifest() -> Manifest {
        let mut platforms = BTreeMap::new();
        platforms.insert(
            Platform::Windows,
            PlatformArtifact {
                version: "1.2.3".to_string(),
                url: "https://downloads.rinawarptech.com/v1.2.3/windows/app.exe".to_string(),
                checksum: "0123456789abcdef0123456789abcdef".to_string(),
                size: 2048,
                min_os: "10.0.0".to_string(),
                architecture: vec!["x86_64".to_string()],
            },
        );

        let mut manifest = Manifest::initial("1.2.3");
        manifest.insert(
            "1.2.3",
            VersionEntry {
                release_date: "2024-03-01".to_string(),
                release_notes: "Fixes".to_string(),
                critical: false,
                expires: None,
                platforms,
            },
            false,
        );
        manifest
    }

    #[tokio::test]
    async fn test_load_missing_manifest_is_not_found() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ManifestStore::at_default_key(storage);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ManifestStore::at_default_key(storage.clone());
        let manifest = sample_manifest();

        let etag = store
            .save(&manifest, WritePrecondition::IfAbsent)
            .await
            .unwrap();

        let (loaded, loaded_etag) = store.load().await.unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded_etag, etag);
    }

    #[tokio::test]
    async fn test_save_sets_no_cache_policy() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ManifestStore::at_default_key(storage.clone());

        store
            .save(&sample_manifest(), WritePrecondition::None)
            .await
            .unwrap();

        assert_eq!(
            storage.cache_control("manifest.json").as_deref(),
            Some("no-cache")
        );
        assert_eq!(
            storage.content_type("manifest.json").as_deref(),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .put(
                "manifest.json",
                b"{not json".to_vec(),
                PutOptions::default(),
            )
            .await
            .unwrap();

        let store = ManifestStore::at_default_key(storage);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[tokio::test]
    async fn test_empty_document_loads_for_validation() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .put("manifest.json", b"{}".to_vec(), PutOptions::default())
            .await
            .unwrap();

        let store = ManifestStore::at_default_key(storage);
        // Missing required fields are not this layer's concern
        let (value, _) = store.load_value().await.unwrap();
        assert!(value.is_object());
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ManifestStore::at_default_key(storage);
        let manifest = sample_manifest();

        let etag = store
            .save(&manifest, WritePrecondition::IfAbsent)
            .await
            .unwrap();

        // A concurrent writer bumps the document to different content
        let mut bumped = manifest.clone();
        bumped.latest = "1.2.4".to_string();
        store
            .save(&bumped, WritePrecondition::IfMatch(etag.clone()))
            .await
            .unwrap();

        // The first writer's tag is now stale
        let err = store
            .save(&manifest, WritePrecondition::IfMatch(etag))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Storage(StorageError::PreconditionFailed { .. })
        ));
    }
}
