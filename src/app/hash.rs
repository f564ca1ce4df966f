//! MD5 digest type for artifact integrity
//!
//! Checksums recorded in the manifest are hex-encoded MD5 digests of the
//! installer bytes. This module stores them as raw 16-byte arrays so that
//! comparisons are cheap and case differences in stored hex never matter.
//! MD5 here is an integrity check against corrupted uploads and truncated
//! downloads, not a security boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ManifestError, ManifestResult};

/// MD5 digest stored as its raw 16-byte representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Md5Hash([u8; 16]);

impl Md5Hash {
    /// Parse a 32-character hex string (case insensitive)
    pub fn from_hex(hex: &str) -> ManifestResult<Self> {
        if hex.len() != 32 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ManifestError::InvalidChecksum {
                value: hex.to_string(),
            });
        }

        let mut bytes = [0u8; 16];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let hex_pair = std::str::from_utf8(chunk).unwrap(); // Safe: validated above
            bytes[i] = u8::from_str_radix(hex_pair, 16).unwrap(); // Safe: validated above
        }

        Ok(Md5Hash(bytes))
    }

    /// Lowercase 32-character hex representation
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        self.0.iter().fold(String::with_capacity(32), |mut acc, b| {
            write!(&mut acc, "{:02x}", b).unwrap();
            acc
        })
    }

    /// Create from a raw digest
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Md5Hash(bytes)
    }

    /// Raw 16-byte digest
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl From<md5::Digest> for Md5Hash {
    fn from(digest: md5::Digest) -> Self {
        Md5Hash(digest.0)
    }
}

impl fmt::Display for Md5Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Md5Hash {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Md5Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Md5Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Md5Hash::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_valid() {
        let hash = Md5Hash::from_hex("50c9d1c465f3cbff652be1509c2e2a4e").unwrap();
        assert_eq!(hash.to_hex(), "50c9d1c465f3cbff652be1509c2e2a4e");
    }

    #[test]
    fn test_from_hex_case_insensitive() {
        let lower = Md5Hash::from_hex("50c9d1c465f3cbff652be1509c2e2a4e").unwrap();
        let upper = Md5Hash::from_hex("50C9D1C465F3CBFF652BE1509C2E2A4E").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Md5Hash::from_hex("too-short").is_err());
        assert!(Md5Hash::from_hex("zzc9d1c465f3cbff652be1509c2e2a4e").is_err());
        assert!(Md5Hash::from_hex("50c9d1c465f3cbff652be1509c2e2a4e00").is_err());
    }

    #[test]
    fn test_digest_conversion() {
        let digest = md5::compute(b"installer bytes");
        let hash = Md5Hash::from(digest);
        assert_eq!(hash.to_hex(), format!("{:x}", digest));
        assert_eq!(hash.as_bytes(), &digest.0);
    }

    #[test]
    fn test_parse_via_from_str() {
        let hash: Md5Hash = "50c9d1c465f3cbff652be1509c2e2a4e".parse().unwrap();
        assert_eq!(hash.to_string(), "50c9d1c465f3cbff652be1509c2e2a4e");
    }

    #[test]
    fn test_serde_round_trip() {
        let hash = Md5Hash::from_hex("50c9d1c465f3cbff652be1509c2e2a4e").unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"50c9d1c465f3cbff652be1509c2e2a4e\"");

        let back: Md5Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
