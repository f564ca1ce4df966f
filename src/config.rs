//! Configuration management for relkit
//!
//! This module provides unified configuration management with multi-source
//! loading and zero-config defaults. Every value has a working default, so
//! the tool runs without a config file; a TOML file adjusts storage
//! location, the downloads host, the platform capability table and tuning
//! knobs, and a couple of environment variables override the most
//! deployment-specific values.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::catalog::PlatformCatalog;
use crate::app::manifest::validator::ValidatorConfig;
use crate::app::publisher::PublisherConfig;
use crate::app::sweeper::SweeperConfig;
use crate::constants::{
    lifecycle, manifest as manifest_consts, transfer, DEFAULT_DOWNLOADS_HOST,
};
use crate::errors::{AppError, ConfigError, Result};

/// Environment variable overriding the storage root
pub const ENV_STORAGE_ROOT: &str = "RELKIT_STORAGE_ROOT";

/// Environment variable overriding the downloads host
pub const ENV_DOWNLOADS_HOST: &str = "RELKIT_DOWNLOADS_HOST";

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Storage backend settings
    pub storage: StorageConfig,
    /// Download hosting settings
    pub hosting: HostingConfig,
    /// Per-platform capability table
    pub platforms: PlatformCatalog,
    /// Publish behavior
    pub publish: PublishConfigToml,
    /// Transfer tuning
    pub transfer: TransferConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory the file-backed object store lives in
    pub root: PathBuf,
    /// Storage key of the manifest document
    pub manifest_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./downloads"),
            manifest_key: manifest_consts::MANIFEST_KEY.to_string(),
        }
    }
}

/// Download hosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingConfig {
    /// Public host encoded into artifact URLs
    pub downloads_host: String,
}

impl HostingConfig {
    /// Public URL of the manifest document
    pub fn manifest_url(&self) -> String {
        format!(
            "{}/{}",
            self.downloads_host.trim_end_matches('/'),
            manifest_consts::MANIFEST_KEY
        )
    }
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            downloads_host: DEFAULT_DOWNLOADS_HOST.to_string(),
        }
    }
}

/// TOML-friendly publish configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfigToml {
    /// Days a beta stays live when no expiry is supplied
    pub beta_expiry_days: i64,
    /// Attempts at a contended manifest write before giving up
    pub write_attempts: u32,
}

impl Default for PublishConfigToml {
    fn default() -> Self {
        Self {
            beta_expiry_days: lifecycle::DEFAULT_BETA_EXPIRY_DAYS,
            write_attempts: transfer::MANIFEST_WRITE_ATTEMPTS,
        }
    }
}

/// Transfer tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bound on concurrent uploads, deletes and download checks
    pub concurrency: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            concurrency: transfer::DEFAULT_TRANSFER_CONCURRENCY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::constants::logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Runtime publisher configuration
    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            downloads_host: self.hosting.downloads_host.clone(),
            catalog: self.platforms.clone(),
            transfer_concurrency: self.transfer.concurrency,
            write_attempts: self.publish.write_attempts,
        }
    }

    /// Runtime sweeper configuration
    pub fn sweeper_config(&self) -> SweeperConfig {
        SweeperConfig {
            transfer_concurrency: self.transfer.concurrency,
            write_attempts: self.publish.write_attempts,
        }
    }

    /// Runtime validator configuration
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            downloads_host: self.hosting.downloads_host.clone(),
            catalog: self.platforms.clone(),
        }
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if one exists)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = if let Some(ref path) = config_file_override {
            Some(path.clone())
        } else {
            Self::find_config_file()
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(AppError::Config(ConfigError::NotFound { path }));
            }
        }

        if let Ok(root) = std::env::var(ENV_STORAGE_ROOT) {
            config.storage.root = PathBuf::from(root);
        }
        if let Ok(host) = std::env::var(ENV_DOWNLOADS_HOST) {
            config.hosting.downloads_host = host;
        }

        Ok(config)
    }

    /// Find a configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from("./relkit.toml")];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Default config file path for the current user
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("relkit").join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig =
            toml::from_str(&content).map_err(|e| AppError::Config(ConfigError::InvalidFormat(e)))?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }
}
