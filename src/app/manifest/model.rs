//! Release manifest data model
//!
//! The manifest is a single JSON document listing every known stable and
//! beta release, the installer artifacts per platform, and the
//! `latest`/`latest_beta`/`minimum_supported` pointers clients use to decide
//! whether to update.
//!
//! Version keys and calendar dates are kept as strings, exactly as they
//! appear in the persisted document: loading stays a purely syntactic
//! operation, and the validator is the one place that judges semantics.
//! Maps are `BTreeMap`s so the document round-trips losslessly and every
//! consumer iterates in a deterministic order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app::version;

/// Operating systems a release can ship installers for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Macos,
    Windows,
    Linux,
}

impl Platform {
    /// All platforms, in catalog order
    pub const ALL: [Platform; 3] = [Platform::Macos, Platform::Windows, Platform::Linux];

    /// Lowercase identifier used in manifest keys and URL paths
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Macos => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "macos" => Ok(Platform::Macos),
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Stable vs beta classification of a release
///
/// Beta is not a boolean: a beta release structurally carries its expiry
/// date, so an entry on the beta track can never silently miss one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseTrack {
    Stable,
    Beta { expires: NaiveDate },
}

impl ReleaseTrack {
    pub fn is_beta(&self) -> bool {
        matches!(self, ReleaseTrack::Beta { .. })
    }
}

/// Storage key of one artifact: `{beta/}v{version}/{platform}/{filename}`
///
/// The URL-shape validation rule depends on this exact layout; publisher and
/// validator must agree on it through this function.
pub fn artifact_key(beta: bool, version: &str, platform: Platform, filename: &str) -> String {
    format!(
        "{}v{}/{}/{}",
        if beta { "beta/" } else { "" },
        version,
        platform,
        filename
    )
}

/// Public download URL of one artifact
pub fn artifact_url(host: &str, beta: bool, version: &str, platform: Platform, filename: &str) -> String {
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        artifact_key(beta, version, platform, filename)
    )
}

/// Storage prefix holding every artifact of one version
pub fn version_prefix(beta: bool, version: &str) -> String {
    format!("{}v{}", if beta { "beta/" } else { "" }, version)
}

/// Per-platform installer metadata within a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformArtifact {
    /// Version string, redundant with the owning entry's key but validated
    pub version: String,
    /// Fully-qualified download URL
    pub url: String,
    /// Hex-encoded MD5 of the installer bytes
    pub checksum: String,
    /// Byte length of the installer
    pub size: u64,
    /// Minimum supported operating system release
    pub min_os: String,
    /// Supported CPU architectures, in preference order
    pub architecture: Vec<String>,
}

/// One release version within the manifest (stable or beta track)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Calendar date the release was published (YYYY-MM-DD)
    pub release_date: String,
    /// Free-text release notes
    pub release_notes: String,
    /// Forces update prompts downstream
    pub critical: bool,
    /// Expiry date, present exactly for beta-track entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    /// Installer metadata per platform; never empty for a valid entry
    pub platforms: BTreeMap<Platform, PlatformArtifact>,
}

impl VersionEntry {
    /// Parse the entry's expiry date, if present and well-formed
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expires
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, crate::constants::DATE_FORMAT).ok())
    }
}

/// The release manifest document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Manifest {
    /// Newest stable release
    #[serde(default)]
    pub latest: String,
    /// Newest non-expired beta release; absent when no betas exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_beta: Option<String>,
    /// Lower bound an installed client must meet
    #[serde(default)]
    pub minimum_supported: String,
    /// Stable track
    #[serde(default)]
    pub versions: BTreeMap<String, VersionEntry>,
    /// Beta track; keys carry a "beta" marker
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub beta: BTreeMap<String, VersionEntry>,
}

impl Manifest {
    /// Manifest state after a first-ever publish of `version`
    pub fn initial(version: &str) -> Self {
        Self {
            latest: version.to_string(),
            latest_beta: None,
            minimum_supported: version.to_string(),
            versions: BTreeMap::new(),
            beta: BTreeMap::new(),
        }
    }

    /// Look up a version on the stable track, optionally falling back to beta
    pub fn entry(&self, version: &str, include_beta: bool) -> Option<&VersionEntry> {
        self.versions.get(version).or_else(|| {
            if include_beta {
                self.beta.get(version)
            } else {
                None
            }
        })
    }

    /// Which track a known version lives on
    pub fn track_of(&self, version: &str) -> Option<bool> {
        if self.versions.contains_key(version) {
            Some(false)
        } else if self.beta.contains_key(version) {
            Some(true)
        } else {
            None
        }
    }

    /// Insert an entry, overwriting any previous entry under the same key
    pub fn insert(&mut self, version: &str, entry: VersionEntry, beta: bool) {
        if beta {
            self.beta.insert(version.to_string(), entry);
        } else {
            self.versions.insert(version.to_string(), entry);
        }
    }

    /// Remove a beta entry, returning it if it existed
    pub fn remove_beta(&mut self, version: &str) -> Option<VersionEntry> {
        self.beta.remove(version)
    }

    /// Point `latest_beta` at the semantically newest remaining beta, or
    /// drop the field when no betas remain
    pub fn recompute_latest_beta(&mut self) {
        // If only unparseable legacy keys remain, fall back to the
        // lexicographic maximum rather than dropping the pointer
        self.latest_beta = version::max_key(self.beta.keys().map(String::as_str))
            .map(str::to_string)
            .or_else(|| self.beta.keys().next_back().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(version: &str) -> PlatformArtifact {
        PlatformArtifact {
            version: version.to_string(),
            url: format!("https://downloads.rinawarptech.com/v{}/macos/app.dmg", version),
            checksum: "50c9d1c465f3cbff652be1509c2e2a4e".to_string(),
            size: 1000,
            min_os: "11.0.0".to_string(),
            architecture: vec!["x86_64".to_string(), "arm64".to_string()],
        }
    }

    fn entry(version: &str, expires: Option<&str>) -> VersionEntry {
        let mut platforms = BTreeMap::new();
        platforms.insert(Platform::Macos, artifact(version));
        VersionEntry {
            release_date: "2024-01-15".to_string(),
            release_notes: "Notes".to_string(),
            critical: false,
            expires: expires.map(str::to_string),
            platforms,
        }
    }

    #[test]
    fn test_initial_manifest() {
        let manifest = Manifest::initial("1.0.0");
        assert_eq!(manifest.latest, "1.0.0");
        assert_eq!(manifest.minimum_supported, "1.0.0");
        assert!(manifest.versions.is_empty());
        assert!(manifest.beta.is_empty());
        assert!(manifest.latest_beta.is_none());
    }

    #[test]
    fn test_entry_lookup_across_tracks() {
        let mut manifest = Manifest::initial("1.0.0");
        manifest.insert("1.0.0", entry("1.0.0", None), false);
        manifest.insert("1.1.0-beta.1", entry("1.1.0-beta.1", Some("2099-01-01")), true);

        assert!(manifest.entry("1.0.0", false).is_some());
        assert!(manifest.entry("1.1.0-beta.1", false).is_none());
        assert!(manifest.entry("1.1.0-beta.1", true).is_some());
        assert_eq!(manifest.track_of("1.1.0-beta.1"), Some(true));
        assert_eq!(manifest.track_of("2.0.0"), None);
    }

    #[test]
    fn test_recompute_latest_beta_uses_semantic_order() {
        let mut manifest = Manifest::initial("1.0.0");
        manifest.insert("1.0.0-beta.2", entry("1.0.0-beta.2", Some("2099-01-01")), true);
        manifest.insert("1.0.0-beta.10", entry("1.0.0-beta.10", Some("2099-01-01")), true);

        manifest.recompute_latest_beta();
        // String ordering would pick beta.2; semantic ordering picks beta.10
        assert_eq!(manifest.latest_beta.as_deref(), Some("1.0.0-beta.10"));

        manifest.remove_beta("1.0.0-beta.10");
        manifest.remove_beta("1.0.0-beta.2");
        manifest.recompute_latest_beta();
        assert!(manifest.latest_beta.is_none());
    }

    #[test]
    fn test_artifact_paths_encode_track_and_platform() {
        assert_eq!(
            artifact_key(false, "1.2.3", Platform::Windows, "app.exe"),
            "v1.2.3/windows/app.exe"
        );
        assert_eq!(
            artifact_key(true, "1.0.0-beta.1", Platform::Macos, "app.dmg"),
            "beta/v1.0.0-beta.1/macos/app.dmg"
        );
        assert_eq!(
            artifact_url("https://downloads.rinawarptech.com/", false, "1.2.3", Platform::Linux, "app.AppImage"),
            "https://downloads.rinawarptech.com/v1.2.3/linux/app.AppImage"
        );
        assert_eq!(version_prefix(true, "1.0.0-beta.1"), "beta/v1.0.0-beta.1");
    }

    #[test]
    fn test_serde_round_trip_preserves_document() {
        let mut manifest = Manifest::initial("1.1.0");
        manifest.insert("1.1.0", entry("1.1.0", None), false);
        manifest.insert("1.2.0-beta.1", entry("1.2.0-beta.1", Some("2099-06-01")), true);
        manifest.latest_beta = Some("1.2.0-beta.1".to_string());

        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn test_absent_optional_fields_stay_absent() {
        let manifest = Manifest::initial("1.0.0");
        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json.get("latest_beta").is_none());
        assert!(json.get("beta").is_none());
    }

    #[test]
    fn test_expiry_date_parsing() {
        let good = entry("1.0.0-beta.1", Some("2024-06-01"));
        assert_eq!(
            good.expiry_date(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );

        let bad = entry("1.0.0-beta.1", Some("June 1st"));
        assert!(bad.expiry_date().is_none());

        let stable = entry("1.0.0", None);
        assert!(stable.expiry_date().is_none());
    }
}
