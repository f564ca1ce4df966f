//! Local artifact probing
//!
//! Computes the size and content checksum of an installer file before it is
//! recorded in the manifest and uploaded. Files are hashed in fixed-size
//! chunks so multi-hundred-megabyte installers never sit in memory whole.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::app::hash::Md5Hash;
use crate::constants::files::HASH_CHUNK_SIZE;
use crate::errors::{ProbeError, ProbeResult};

/// Size and checksum of a local artifact file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    /// Byte length of the file
    pub size: u64,
    /// MD5 digest of the full byte stream
    pub checksum: Md5Hash,
}

/// Probe a local artifact file for its size and checksum
///
/// Fails with [`ProbeError::NotFound`] when the path does not exist.
pub async fn probe(path: &Path) -> ProbeResult<ArtifactInfo> {
    if !path.exists() {
        return Err(ProbeError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = File::open(path).await?;
    let size = file.metadata().await?.len();

    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        context.consume(&buffer[..read]);
    }

    Ok(ArtifactInfo {
        size,
        checksum: Md5Hash::from(context.compute()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_probe_reports_size_and_checksum() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.dmg");
        let content = b"installer payload";
        tokio::fs::write(&path, content).await.unwrap();

        let info = probe(&path).await.unwrap();

        assert_eq!(info.size, content.len() as u64);
        assert_eq!(info.checksum, Md5Hash::from(md5::compute(content)));
    }

    #[tokio::test]
    async fn test_probe_matches_single_shot_hash_on_multi_chunk_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.exe");
        // Three and a bit chunks, so the streaming path is exercised
        let content = vec![0xA5u8; HASH_CHUNK_SIZE * 3 + 517];
        tokio::fs::write(&path, &content).await.unwrap();

        let info = probe(&path).await.unwrap();

        assert_eq!(info.size, content.len() as u64);
        assert_eq!(info.checksum, Md5Hash::from(md5::compute(&content)));
    }

    #[tokio::test]
    async fn test_probe_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.AppImage");

        let err = probe(&path).await.unwrap_err();
        assert!(matches!(err, ProbeError::NotFound { .. }));
    }
}
