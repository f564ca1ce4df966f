//! Application constants for relkit
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

/// Manifest document constants
pub mod manifest {
    /// Storage key of the release manifest document
    pub const MANIFEST_KEY: &str = "manifest.json";

    /// Content type used when persisting the manifest
    pub const MANIFEST_CONTENT_TYPE: &str = "application/json";

    /// Cache policy for the manifest object - readers must always see the
    /// current document
    pub const MANIFEST_CACHE_CONTROL: &str = "no-cache";
}

/// Download hosting constants
pub mod hosting {
    /// Default public host serving installer downloads
    pub const DEFAULT_DOWNLOADS_HOST: &str = "https://downloads.rinawarptech.com";

    /// Cache policy for immutable installer artifacts
    pub const ARTIFACT_CACHE_CONTROL: &str = "public, max-age=31536000";
}

/// File operation constants
pub mod files {
    /// Chunk size for streaming hash computation (8KB)
    pub const HASH_CHUNK_SIZE: usize = 8 * 1024;
}

/// Transfer and concurrency configuration
pub mod transfer {
    /// Bound on concurrent artifact uploads, deletes and download checks
    pub const DEFAULT_TRANSFER_CONCURRENCY: usize = 5;

    /// Attempts at the load-mutate-save cycle before giving up on a
    /// contended manifest
    pub const MANIFEST_WRITE_ATTEMPTS: u32 = 3;
}

/// Release lifecycle constants
pub mod lifecycle {
    /// Days a beta release remains live when no expiry is supplied
    pub const DEFAULT_BETA_EXPIRY_DAYS: i64 = 30;

    /// Marker that every beta version key must carry
    pub const BETA_MARKER: &str = "beta";
}

/// Date handling constants
pub mod dates {
    /// Calendar date format used throughout the manifest (YYYY-MM-DD)
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use dates::DATE_FORMAT;
pub use hosting::DEFAULT_DOWNLOADS_HOST;
pub use lifecycle::{BETA_MARKER, DEFAULT_BETA_EXPIRY_DAYS};
pub use manifest::MANIFEST_KEY;
pub use transfer::DEFAULT_TRANSFER_CONCURRENCY;
