//! Command handlers for the relkit CLI
//!
//! This module implements the main command handlers that coordinate between
//! CLI arguments and the core release pipeline. Each handler streams one
//! line per completed unit of work, prints a final summary, and returns an
//! error when the operation's success criterion was not met so the process
//! exits non-zero.

use std::sync::Arc;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::app::checker::{versions_to_check, DownloadCheck, DownloadChecker};
use crate::app::manifest::diff::{diff_versions, format_json, format_markdown};
use crate::app::manifest::model::ReleaseTrack;
use crate::app::manifest::store::ManifestStore;
use crate::app::manifest::validator::validate;
use crate::app::publisher::{resolve_beta_expiry, PublishRequest, Publisher};
use crate::app::storage::{LocalStorage, Storage};
use crate::app::sweeper::Sweeper;
use crate::cli::args::{CheckArgs, DiffArgs, DiffFormat, PublishArgs, SweepArgs, ValidateArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Open the configured storage backend and a manifest store on it
fn open_store(config: &AppConfig) -> Result<(Arc<dyn Storage>, ManifestStore)> {
    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(&config.storage.root)?);
    let store = ManifestStore::new(storage.clone(), config.storage.manifest_key.clone());
    Ok((storage, store))
}

/// Handle the publish command
pub async fn handle_publish(args: PublishArgs, config: AppConfig) -> Result<()> {
    let artifacts = args.artifact_paths();
    if artifacts.is_empty() {
        return Err(AppError::generic(
            "At least one platform installer must be specified",
        ));
    }

    let today = Local::now().date_naive();
    let track = if args.beta {
        let expires = resolve_beta_expiry(args.beta_expires.as_deref(), today)?;
        ReleaseTrack::Beta { expires }
    } else {
        ReleaseTrack::Stable
    };

    let (storage, store) = open_store(&config)?;
    let publisher = Publisher::new(store, storage, config.publisher_config());

    let request = PublishRequest {
        version: args.version.clone(),
        artifacts,
        notes: args.notes.clone(),
        critical: args.critical,
        track,
    };

    info!(version = %args.version, beta = args.beta, "starting publish");
    let outcome = publisher.publish(&request, today).await?;

    for platform in &outcome.skipped {
        println!("⚠️  Skipped {}: installer file not found", platform);
    }

    println!(
        "\nPublished version {}: {} uploaded, {} skipped, {} failed",
        args.version,
        outcome.uploaded.len(),
        outcome.skipped.len(),
        outcome.upload_failures.len()
    );

    if !outcome.upload_failures.is_empty() {
        let failed: Vec<String> = outcome
            .upload_failures
            .iter()
            .map(|p| p.to_string())
            .collect();
        return Err(AppError::generic(format!(
            "Upload failed for: {}",
            failed.join(", ")
        )));
    }

    Ok(())
}

/// Handle the sweep command
pub async fn handle_sweep(args: SweepArgs, config: AppConfig) -> Result<()> {
    let (storage, store) = open_store(&config)?;
    let sweeper = Sweeper::new(store, storage, config.sweeper_config());

    let today = Local::now().date_naive();
    println!("Checking for expired beta releases...");
    let outcome = sweeper.sweep(today, args.dry_run).await?;

    if outcome.removed.is_empty() {
        println!("No expired beta releases found");
    } else if args.dry_run {
        println!(
            "\nDRY RUN - {} beta release(s) would be deleted",
            outcome.removed.len()
        );
    } else {
        println!(
            "\nCleanup complete: removed {} beta release(s)",
            outcome.removed.len()
        );
    }

    Ok(())
}

/// Handle the validate command
pub async fn handle_validate(args: ValidateArgs, config: AppConfig) -> Result<()> {
    let manifest: serde_json::Value = match &args.file {
        Some(path) => {
            let content = tokio::fs::read(path).await?;
            serde_json::from_slice(&content)
                .map_err(crate::errors::ManifestError::Parse)?
        }
        None => {
            let (_, store) = open_store(&config)?;
            let (value, _) = store.load_value().await?;
            value
        }
    };

    let violations = validate(&manifest, &config.validator_config());

    for violation in &violations {
        println!("❌ {}", violation);
    }

    if violations.is_empty() {
        println!("✅ Manifest is valid");
        Ok(())
    } else {
        println!("\nFound {} violation(s)", violations.len());
        Err(AppError::generic("Manifest validation failed"))
    }
}

/// Handle the check command
pub async fn handle_check(args: CheckArgs, config: AppConfig) -> Result<()> {
    let manifest_url = args
        .manifest_url
        .clone()
        .unwrap_or_else(|| config.hosting.manifest_url());

    let checker = DownloadChecker::with_concurrency(config.transfer.concurrency);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("Fetching manifest from {}", manifest_url));
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let manifest = checker.fetch_manifest(&manifest_url).await;
    spinner.finish_and_clear();
    let manifest = manifest?;

    let versions = versions_to_check(&manifest, args.version.as_deref(), args.include_beta)?;
    println!("Validating {} version(s)...", versions.len());

    let mut results: Vec<DownloadCheck> = Vec::new();
    for version in &versions {
        let entry = match manifest.entry(version, true) {
            Some(entry) => entry,
            None => continue,
        };

        let version_results = checker.check_entry(version, entry).await;
        for result in &version_results {
            let status = if result.valid { "✅" } else { "❌" };
            println!(
                "{} {} {}: {}",
                status, result.version, result.platform, result.message
            );
        }
        results.extend(version_results);
    }

    let total = results.len();
    let valid = results.iter().filter(|r| r.valid).count();
    println!("\nSummary: {}/{} downloads validated successfully", valid, total);

    if let Some(output) = &args.output {
        let report = serde_json::json!({
            "timestamp": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            "manifest_url": manifest_url,
            "total_downloads": total,
            "valid_downloads": valid,
            "results": results,
        });
        let body = serde_json::to_vec_pretty(&report).map_err(crate::errors::ManifestError::Parse)?;
        tokio::fs::write(output, body).await?;
        println!("\nDetailed results written to {}", output.display());
    }

    if valid != total {
        return Err(AppError::generic("One or more downloads failed validation"));
    }

    Ok(())
}

/// Handle the diff command
pub async fn handle_diff(args: DiffArgs, config: AppConfig) -> Result<()> {
    let (_, store) = open_store(&config)?;
    let (manifest, _) = store.load().await?;

    let changes = diff_versions(&manifest, &args.old_version, &args.new_version)?;

    let output = match args.format {
        DiffFormat::Markdown => format_markdown(&changes),
        DiffFormat::Json => format_json(&changes).map_err(crate::errors::ManifestError::Parse)?,
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, output).await?;
            println!("Changelog written to {}", path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}
