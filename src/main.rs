//! relkit CLI application
//!
//! Command-line interface for publishing and maintaining desktop application
//! releases: manifest updates, beta expiry sweeps, validation, download
//! verification and version diffing.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use relkit::cli::{
    handle_check, handle_diff, handle_publish, handle_sweep, handle_validate, Cli, Commands,
};
use relkit::config::AppConfig;
use relkit::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(&cli);

    info!("relkit v{} starting", env!("CARGO_PKG_VERSION"));

    // Load configuration and apply CLI overrides
    let mut config = AppConfig::load(cli.global.config.clone()).await?;
    if let Some(root) = &cli.global.storage_root {
        config.storage.root = root.clone();
    }

    // Execute the appropriate command
    match cli.command {
        Commands::Publish(args) => {
            info!("Executing publish command");
            handle_publish(args, config).await
        }
        Commands::Sweep(args) => {
            info!("Executing sweep command");
            handle_sweep(args, config).await
        }
        Commands::Validate(args) => {
            info!("Executing validate command");
            handle_validate(args, config).await
        }
        Commands::Check(args) => {
            info!("Executing check command");
            handle_check(args, config).await
        }
        Commands::Diff(args) => {
            info!("Executing diff command");
            handle_diff(args, config).await
        }
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("relkit={}", log_level).parse().unwrap());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
