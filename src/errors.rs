//! Error types for relkit
//!
//! This module defines the error types for all components of the release
//! tooling. Per-platform transfer failures are deliberately *not* modelled
//! here as fatal errors (publish and sweep log and skip them), while
//! manifest load/parse failures always abort the surrounding operation.

use std::path::PathBuf;
use thiserror::Error;

/// Object storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Requested key does not exist in the backing store
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// Conditional write failed - the object changed since it was read
    #[error("Precondition failed writing {key}: object was modified concurrently")]
    PreconditionFailed { key: String },

    /// Underlying provider/backend failure
    #[error("Storage backend error: {message}")]
    Backend { message: String },

    /// I/O error from a file-backed store
    #[error("Storage I/O error")]
    Io(#[from] std::io::Error),
}

/// Manifest loading, parsing and persistence errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest object/file is absent
    #[error("Manifest not found at {key}")]
    NotFound { key: String },

    /// Manifest body is not valid JSON (missing fields are the Validator's
    /// job, not a parse error)
    #[error("Manifest is not valid JSON")]
    Parse(#[from] serde_json::Error),

    /// Recorded checksum is not a 32-character hex string
    #[error("Invalid checksum in manifest: {value}")]
    InvalidChecksum { value: String },

    /// Storage-level failure while reading or writing the manifest
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Local artifact probing errors
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Artifact file does not exist
    #[error("Artifact file not found: {path}")]
    NotFound { path: PathBuf },

    /// I/O error while reading the artifact
    #[error("Failed to read artifact")]
    Io(#[from] std::io::Error),
}

/// Version string parsing errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// Not a valid semantic version
    #[error("Invalid semantic version: {value}")]
    Invalid {
        value: String,
        #[source]
        source: semver::Error,
    },
}

/// Release publishing errors
#[derive(Error, Debug)]
pub enum PublishError {
    /// No artifact path resolved to an existing file
    #[error("No installer files found - at least one platform artifact must exist")]
    NoArtifacts,

    /// Caller-supplied date string is not YYYY-MM-DD
    #[error("Invalid date: {value} (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    /// Version string supplied for the release is not semver
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Manifest load/save failure
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Concurrent writers kept clobbering the manifest
    #[error("Manifest write conflicted {attempts} times, giving up")]
    Contention { attempts: u32 },
}

/// Beta expiry sweep errors
#[derive(Error, Debug)]
pub enum SweepError {
    /// Manifest load/save failure
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Concurrent writers kept clobbering the manifest
    #[error("Manifest write conflicted {attempts} times, giving up")]
    Contention { attempts: u32 },
}

/// Download checking errors
#[derive(Error, Debug)]
pub enum CheckError {
    /// HTTP request failed
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Downloaded bytes do not hash to the manifest's recorded checksum
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Requested version is not present in the manifest
    #[error("Version {version} not found in manifest")]
    VersionNotFound { version: String },

    /// Manifest fetch/parse failure
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Version diffing errors
#[derive(Error, Debug)]
pub enum DiffError {
    /// One of the versions to compare is not in the manifest
    #[error("Version {version} not found in manifest")]
    VersionNotFound { version: String },

    /// A version string failed to parse
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Old version is not strictly below the new version
    #[error("Old version {old} must be less than new version {new}")]
    NotMonotonic { old: String, new: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Sweep(#[from] SweepError),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("{message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Storage(_) => "storage",
            AppError::Manifest(_) => "manifest",
            AppError::Probe(_) => "probe",
            AppError::Version(_) => "version",
            AppError::Publish(_) => "publish",
            AppError::Sweep(_) => "sweep",
            AppError::Check(_) => "check",
            AppError::Diff(_) => "diff",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Storage result type alias
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Probe result type alias
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Publish result type alias
pub type PublishResult<T> = std::result::Result<T, PublishError>;

/// Sweep result type alias
pub type SweepResult<T> = std::result::Result<T, SweepError>;

/// Check result type alias
pub type CheckResult<T> = std::result::Result<T, CheckError>;
