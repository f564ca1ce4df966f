//! Release manifest: model, persistence, validation and diffing
//!
//! The manifest is the single source of truth for which application versions
//! exist, which platforms each version ships for, where the installers live,
//! their checksums, and the stable/beta lifecycle. This module owns its
//! in-memory representation, the store that loads and saves it, the rule set
//! that judges a loaded document, and the read-only differ feeding changelog
//! generation.

pub mod diff;
pub mod model;
pub mod store;
pub mod validator;

pub use diff::{diff, diff_versions, format_json, format_markdown, Change, ChangeKind, Component};
pub use model::{
    artifact_key, artifact_url, version_prefix, Manifest, Platform, PlatformArtifact,
    ReleaseTrack, VersionEntry,
};
pub use store::ManifestStore;
pub use validator::{validate, RuleId, ValidatorConfig, Violation};
