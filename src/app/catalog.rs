//! Per-platform capability catalog
//!
//! Each platform ships with fixed capability metadata: the minimum OS the
//! installer supports, the CPU architectures it contains, the installer
//! extension and the content-type it is served with. These are properties of
//! how the desktop app is built, not of any single release, so they live in
//! one injected table rather than being supplied per publish.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::app::manifest::model::Platform;

/// Fixed capability metadata for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSpec {
    /// Minimum supported operating system release
    pub min_os: String,
    /// CPU architectures the installer contains, in preference order
    pub architecture: Vec<String>,
    /// Installer file extension, including the dot
    pub extension: String,
    /// Content type the installer is uploaded with
    pub content_type: String,
}

/// Capability table for all shippable platforms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformCatalog {
    specs: BTreeMap<Platform, PlatformSpec>,
}

impl PlatformCatalog {
    /// Build a catalog from explicit entries
    pub fn new(specs: BTreeMap<Platform, PlatformSpec>) -> Self {
        Self { specs }
    }

    /// Capability spec for a platform, if it is in the catalog
    pub fn spec(&self, platform: Platform) -> Option<&PlatformSpec> {
        self.specs.get(&platform)
    }

    /// Expected installer extension for a named platform key
    pub fn extension_for(&self, platform_key: &str) -> Option<&str> {
        platform_key
            .parse::<Platform>()
            .ok()
            .and_then(|p| self.spec(p))
            .map(|s| s.extension.as_str())
    }
}

impl Default for PlatformCatalog {
    fn default() -> Self {
        let mut specs = BTreeMap::new();
        specs.insert(
            Platform::Macos,
            PlatformSpec {
                min_os: "11.0.0".to_string(),
                architecture: vec!["x86_64".to_string(), "arm64".to_string()],
                extension: ".dmg".to_string(),
                content_type: "application/x-apple-diskimage".to_string(),
            },
        );
        specs.insert(
            Platform::Windows,
            PlatformSpec {
                min_os: "10.0.0".to_string(),
                architecture: vec!["x86_64".to_string()],
                extension: ".exe".to_string(),
                content_type: "application/vnd.microsoft.portable-executable".to_string(),
            },
        );
        specs.insert(
            Platform::Linux,
            PlatformSpec {
                min_os: "Ubuntu 20.04".to_string(),
                architecture: vec!["x86_64".to_string(), "arm64".to_string()],
                extension: ".AppImage".to_string(),
                content_type: "application/x-executable".to_string(),
            },
        );
        Self { specs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_covers_all_platforms() {
        let catalog = PlatformCatalog::default();
        for platform in Platform::ALL {
            assert!(catalog.spec(platform).is_some(), "{} missing", platform);
        }
    }

    #[test]
    fn test_default_extensions() {
        let catalog = PlatformCatalog::default();
        assert_eq!(catalog.extension_for("macos"), Some(".dmg"));
        assert_eq!(catalog.extension_for("windows"), Some(".exe"));
        assert_eq!(catalog.extension_for("linux"), Some(".AppImage"));
        assert_eq!(catalog.extension_for("beos"), None);
    }
}
