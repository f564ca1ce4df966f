//! Command-line argument parsing for relkit
//!
//! This module defines the CLI structure using clap derive macros, covering
//! release publishing, beta cleanup, manifest validation, download checking
//! and changelog diffing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// relkit - manage desktop application release manifests
#[derive(Parser, Debug)]
#[command(
    name = "relkit",
    version,
    about = "Publish, validate and clean up desktop application releases",
    long_about = "Operational tooling around the release manifest: publish new versions with \
their platform installers, sweep expired betas, validate the manifest against its rules, \
verify published downloads, and diff versions for changelog generation."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Storage root directory override
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_root: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish a release: upload installers and update the manifest
    Publish(PublishArgs),

    /// Remove expired beta releases and their artifacts
    Sweep(SweepArgs),

    /// Validate the manifest against its structural rules
    Validate(ValidateArgs),

    /// Download published installers and verify their checksums
    Check(CheckArgs),

    /// Diff two versions for changelog generation
    Diff(DiffArgs),
}

/// Arguments for the publish command
#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    /// Version number (e.g., 1.2.3 or 1.3.0-beta.1)
    pub version: String,

    /// Path to the macOS installer (.dmg)
    #[arg(long, value_name = "FILE")]
    pub macos: Option<PathBuf>,

    /// Path to the Windows installer (.exe)
    #[arg(long, value_name = "FILE")]
    pub windows: Option<PathBuf>,

    /// Path to the Linux installer (.AppImage)
    #[arg(long, value_name = "FILE")]
    pub linux: Option<PathBuf>,

    /// Release notes
    #[arg(long, default_value = "")]
    pub notes: String,

    /// Mark as a critical update
    #[arg(long)]
    pub critical: bool,

    /// Publish on the beta track
    #[arg(long)]
    pub beta: bool,

    /// Beta expiration date (YYYY-MM-DD); defaults to 30 days out
    #[arg(long, value_name = "DATE", requires = "beta")]
    pub beta_expires: Option<String>,
}

/// Arguments for the sweep command
#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Show what would be deleted without actually deleting
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Validate a local manifest file instead of the stored one
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Manifest URL; defaults to the configured downloads host
    #[arg(long, value_name = "URL")]
    pub manifest_url: Option<String>,

    /// Specific version to check
    #[arg(long)]
    pub version: Option<String>,

    /// Include beta versions in the check
    #[arg(long)]
    pub include_beta: bool,

    /// Write detailed JSON results to a file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Output format for diff results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiffFormat {
    Markdown,
    Json,
}

impl std::fmt::Display for DiffFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffFormat::Markdown => f.write_str("markdown"),
            DiffFormat::Json => f.write_str("json"),
        }
    }
}

/// Arguments for the diff command
#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    /// Old version number
    pub old_version: String,

    /// New version number
    pub new_version: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = DiffFormat::Markdown)]
    pub format: DiffFormat,

    /// Output file (default: stdout)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}

impl PublishArgs {
    /// Installer paths by platform, omitting unspecified platforms
    pub fn artifact_paths(
        &self,
    ) -> std::collections::BTreeMap<crate::app::manifest::model::Platform, PathBuf> {
        use crate::app::manifest::model::Platform;

        let mut paths = std::collections::BTreeMap::new();
        if let Some(path) = &self.macos {
            paths.insert(Platform::Macos, path.clone());
        }
        if let Some(path) = &self.windows {
            paths.insert(Platform::Windows, path.clone());
        }
        if let Some(path) = &self.linux {
            paths.insert(Platform::Linux, path.clone());
        }
        paths
    }
}
