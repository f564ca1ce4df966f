//! Object storage abstraction
//!
//! The release pipeline touches storage in exactly four ways: fetch an
//! object, overwrite an object, delete an object, and enumerate a version
//! prefix. This module captures that contract as a trait so the manifest
//! store, publisher and sweeper never depend on a concrete provider.
//!
//! Every object carries an entity tag (MD5 of its content, mirroring what
//! object stores report) and writes accept a precondition on it. All manifest
//! mutation rides on that: read the tag with the document, write back only if
//! the tag still matches, retry the whole cycle otherwise.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::hash::Md5Hash;
use crate::errors::{StorageError, StorageResult};

/// An object fetched from storage, with the entity tag it had at read time
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Raw object bytes
    pub bytes: Vec<u8>,
    /// Entity tag for conditional writes
    pub etag: String,
}

/// Condition attached to a write
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WritePrecondition {
    /// Blind overwrite
    #[default]
    None,
    /// Write only if the object's current tag matches
    IfMatch(String),
    /// Write only if no object exists under the key
    IfAbsent,
}

/// Metadata and preconditions for a write
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// MIME type served for the object
    pub content_type: Option<String>,
    /// Cache policy for downstream CDNs
    pub cache_control: Option<String>,
    /// Content-Disposition header (forces browser download of installers)
    pub content_disposition: Option<String>,
    /// Conditional-write requirement
    pub precondition: WritePrecondition,
}

impl PutOptions {
    /// Options for an immutable installer artifact
    pub fn artifact(content_type: &str, filename: &str) -> Self {
        Self {
            content_type: Some(content_type.to_string()),
            cache_control: Some(crate::constants::hosting::ARTIFACT_CACHE_CONTROL.to_string()),
            content_disposition: Some(format!("attachment; filename={}", filename)),
            precondition: WritePrecondition::None,
        }
    }

    /// Options for the manifest document with a conditional write
    pub fn manifest(precondition: WritePrecondition) -> Self {
        Self {
            content_type: Some(crate::constants::manifest::MANIFEST_CONTENT_TYPE.to_string()),
            cache_control: Some(crate::constants::manifest::MANIFEST_CACHE_CONTROL.to_string()),
            content_disposition: None,
            precondition,
        }
    }
}

/// Storage contract consumed by the manifest store, publisher and sweeper
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch an object; `NotFound` if the key is absent
    async fn get(&self, key: &str) -> StorageResult<StoredObject>;

    /// Write an object, honoring the precondition in `options`; returns the
    /// new entity tag
    async fn put(&self, key: &str, bytes: Vec<u8>, options: PutOptions) -> StorageResult<String>;

    /// Delete an object; deleting an absent key succeeds
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// List all keys under a prefix
    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

fn compute_etag(bytes: &[u8]) -> String {
    Md5Hash::from(md5::compute(bytes)).to_hex()
}

fn check_precondition(
    key: &str,
    current: Option<&str>,
    precondition: &WritePrecondition,
) -> StorageResult<()> {
    let ok = match precondition {
        WritePrecondition::None => true,
        WritePrecondition::IfAbsent => current.is_none(),
        WritePrecondition::IfMatch(expected) => current == Some(expected.as_str()),
    };

    if ok {
        Ok(())
    } else {
        Err(StorageError::PreconditionFailed {
            key: key.to_string(),
        })
    }
}

/// Directory-rooted storage backend
///
/// Keys map to paths under the root. Media metadata from [`PutOptions`] has
/// no filesystem representation and is dropped; it only matters for remote
/// object stores.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn collect_keys(&self, dir: &Path, keys: &mut Vec<String>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                self.collect_keys(&path, keys)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                keys.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound {
                    key: key.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let etag = compute_etag(&bytes);
        Ok(StoredObject { bytes, etag })
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, options: PutOptions) -> StorageResult<String> {
        let path = self.path_for(key);

        let current = match tokio::fs::read(&path).await {
            Ok(existing) => Some(compute_etag(&existing)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        check_precondition(key, current.as_deref(), &options.precondition)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a temp name then rename, so readers never observe a
        // half-written object
        let mut tmp_name = path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        Ok(compute_etag(&bytes))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        if self.root.exists() {
            self.collect_keys(&self.root.clone(), &mut keys)?;
        }
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    bytes: Vec<u8>,
    etag: String,
    content_type: Option<String>,
    cache_control: Option<String>,
}

/// In-memory storage backend for tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Cache-Control recorded for a key, if the object exists
    pub fn cache_control(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .and_then(|e| e.cache_control.clone())
    }

    /// Content-Type recorded for a key, if the object exists
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .and_then(|e| e.content_type.clone())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        let objects = self.objects.lock().unwrap();
        let entry = objects.get(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        Ok(StoredObject {
            bytes: entry.bytes.clone(),
            etag: entry.etag.clone(),
        })
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, options: PutOptions) -> StorageResult<String> {
        let mut objects = self.objects.lock().unwrap();
        let current = objects.get(key).map(|e| e.etag.clone());
        check_precondition(key, current.as_deref(), &options.precondition)?;

        let etag = compute_etag(&bytes);
        objects.insert(
            key.to_string(),
            MemoryEntry {
                bytes,
                etag: etag.clone(),
                content_type: options.content_type,
                cache_control: options.cache_control,
            },
        );
        Ok(etag)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let objects = self.objects.lock().unwrap();
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_round_trip_and_etag() {
        let storage = MemoryStorage::new();

        let etag = storage
            .put("manifest.json", b"{}".to_vec(), PutOptions::default())
            .await
            .unwrap();

        let object = storage.get("manifest.json").await.unwrap();
        assert_eq!(object.bytes, b"{}");
        assert_eq!(object.etag, etag);
        assert_eq!(storage.object_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_get_missing_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.get("absent").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_if_match_rejects_stale_writer() {
        let storage = MemoryStorage::new();
        let etag = storage
            .put("manifest.json", b"v1".to_vec(), PutOptions::default())
            .await
            .unwrap();

        // Another writer sneaks in
        storage
            .put("manifest.json", b"v2".to_vec(), PutOptions::default())
            .await
            .unwrap();

        let stale = PutOptions {
            precondition: WritePrecondition::IfMatch(etag),
            ..Default::default()
        };
        let err = storage
            .put("manifest.json", b"v3".to_vec(), stale)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn test_if_absent_rejects_existing_object() {
        let storage = MemoryStorage::new();
        storage
            .put("manifest.json", b"v1".to_vec(), PutOptions::default())
            .await
            .unwrap();

        let options = PutOptions {
            precondition: WritePrecondition::IfAbsent,
            ..Default::default()
        };
        let err = storage
            .put("manifest.json", b"v2".to_vec(), options)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn test_local_round_trip_and_prefix_listing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        storage
            .put(
                "beta/v1.0.0-beta.1/macos/app.dmg",
                b"dmg".to_vec(),
                PutOptions::default(),
            )
            .await
            .unwrap();
        storage
            .put(
                "beta/v1.0.0-beta.1/windows/app.exe",
                b"exe".to_vec(),
                PutOptions::default(),
            )
            .await
            .unwrap();
        storage
            .put("v1.0.0/macos/app.dmg", b"dmg".to_vec(), PutOptions::default())
            .await
            .unwrap();

        let keys = storage.list_by_prefix("beta/v1.0.0-beta.1").await.unwrap();
        assert_eq!(
            keys,
            vec![
                "beta/v1.0.0-beta.1/macos/app.dmg".to_string(),
                "beta/v1.0.0-beta.1/windows/app.exe".to_string(),
            ]
        );

        let object = storage.get("v1.0.0/macos/app.dmg").await.unwrap();
        assert_eq!(object.bytes, b"dmg");
    }

    #[tokio::test]
    async fn test_local_conditional_write() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        let etag = storage
            .put("manifest.json", b"v1".to_vec(), PutOptions::default())
            .await
            .unwrap();

        // Matching tag goes through
        let options = PutOptions {
            precondition: WritePrecondition::IfMatch(etag),
            ..Default::default()
        };
        let new_etag = storage
            .put("manifest.json", b"v2".to_vec(), options)
            .await
            .unwrap();

        // Reusing the old tag is now rejected
        let stale = PutOptions {
            precondition: WritePrecondition::IfMatch("deadbeef".repeat(4)),
            ..Default::default()
        };
        let err = storage
            .put("manifest.json", b"v3".to_vec(), stale)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PreconditionFailed { .. }));

        let object = storage.get("manifest.json").await.unwrap();
        assert_eq!(object.bytes, b"v2");
        assert_eq!(object.etag, new_etag);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        storage
            .put("v1.0.0/linux/app.AppImage", b"bin".to_vec(), PutOptions::default())
            .await
            .unwrap();
        storage.delete("v1.0.0/linux/app.AppImage").await.unwrap();
        storage.delete("v1.0.0/linux/app.AppImage").await.unwrap();

        assert!(storage.get("v1.0.0/linux/app.AppImage").await.is_err());
    }
}
