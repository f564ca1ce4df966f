//! Structured diffing of manifest entries
//!
//! Read-only comparison of two release entries, feeding changelog
//! generation. Change ordering is fixed (documentation, critical flag,
//! added platforms, removed platforms, modified platforms in key order) so
//! the rendered changelog is reproducible run over run.

use serde::Serialize;

use super::model::{Manifest, Platform, VersionEntry};
use crate::app::version;
use crate::errors::DiffError;

/// What happened to a compared element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// Which part of the release changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Platform,
    Release,
    Documentation,
}

/// One difference between two release entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub component: Component,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

/// Compare two release entries
pub fn diff(old: &VersionEntry, new: &VersionEntry) -> Vec<Change> {
    let mut changes = Vec::new();

    if old.release_notes != new.release_notes {
        changes.push(Change {
            kind: ChangeKind::Modified,
            component: Component::Documentation,
            description: "Release notes updated".to_string(),
            platform: None,
        });
    }

    if old.critical != new.critical {
        changes.push(Change {
            kind: ChangeKind::Modified,
            component: Component::Release,
            description: format!("Critical flag changed: {} -> {}", old.critical, new.critical),
            platform: None,
        });
    }

    for (platform, _) in new.platforms.iter().filter(|(p, _)| !old.platforms.contains_key(p)) {
        changes.push(Change {
            kind: ChangeKind::Added,
            component: Component::Platform,
            description: format!("Added support for {}", platform),
            platform: Some(*platform),
        });
    }

    for (platform, _) in old.platforms.iter().filter(|(p, _)| !new.platforms.contains_key(p)) {
        changes.push(Change {
            kind: ChangeKind::Removed,
            component: Component::Platform,
            description: format!("Removed support for {}", platform),
            platform: Some(*platform),
        });
    }

    for (platform, old_artifact) in &old.platforms {
        let new_artifact = match new.platforms.get(platform) {
            Some(artifact) => artifact,
            None => continue,
        };

        if old_artifact.min_os != new_artifact.min_os {
            changes.push(Change {
                kind: ChangeKind::Modified,
                component: Component::Platform,
                description: format!(
                    "Updated min_os: {} -> {}",
                    old_artifact.min_os, new_artifact.min_os
                ),
                platform: Some(*platform),
            });
        }

        if old_artifact.architecture != new_artifact.architecture {
            changes.push(Change {
                kind: ChangeKind::Modified,
                component: Component::Platform,
                description: format!(
                    "Updated architecture: {:?} -> {:?}",
                    old_artifact.architecture, new_artifact.architecture
                ),
                platform: Some(*platform),
            });
        }

        if old_artifact.size != new_artifact.size {
            let delta = new_artifact.size as i64 - old_artifact.size as i64;
            let sign = if delta > 0 { "+" } else { "" };
            changes.push(Change {
                kind: ChangeKind::Modified,
                component: Component::Platform,
                description: format!("Size changed by {}{} bytes", sign, delta),
                platform: Some(*platform),
            });
        }
    }

    changes
}

/// Compare two versions by key, looking in both tracks
///
/// Fails when either version is missing, either key is not semver, or the
/// old version does not precede the new one.
pub fn diff_versions(
    manifest: &Manifest,
    old_version: &str,
    new_version: &str,
) -> Result<Vec<Change>, DiffError> {
    let old_parsed = version::parse(old_version)?;
    let new_parsed = version::parse(new_version)?;
    if old_parsed >= new_parsed {
        return Err(DiffError::NotMonotonic {
            old: old_version.to_string(),
            new: new_version.to_string(),
        });
    }

    let old_entry = manifest
        .entry(old_version, true)
        .ok_or_else(|| DiffError::VersionNotFound {
            version: old_version.to_string(),
        })?;
    let new_entry = manifest
        .entry(new_version, true)
        .ok_or_else(|| DiffError::VersionNotFound {
            version: new_version.to_string(),
        })?;

    Ok(diff(old_entry, new_entry))
}

/// Render changes as a markdown changelog fragment
pub fn format_markdown(changes: &[Change]) -> String {
    let mut lines = Vec::new();

    let release_changes: Vec<&Change> = changes
        .iter()
        .filter(|c| c.component != Component::Platform)
        .collect();
    if !release_changes.is_empty() {
        lines.push("\n## Release Changes\n".to_string());
        for change in release_changes {
            lines.push(format!("- {}", change.description));
        }
    }

    let platform_changes: Vec<&Change> = changes
        .iter()
        .filter(|c| c.component == Component::Platform)
        .collect();
    if !platform_changes.is_empty() {
        lines.push("\n## Platform Changes\n".to_string());
        for change in platform_changes {
            let platform = change
                .platform
                .map(|p| format!(" ({})", p))
                .unwrap_or_default();
            lines.push(format!("- {}{}", change.description, platform));
        }
    }

    lines.join("\n")
}

/// Render changes as a JSON document
pub fn format_json(changes: &[Change]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({ "changes": changes }))
}
