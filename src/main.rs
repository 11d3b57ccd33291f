//! nfw-reconciler - Network firewall configuration reconciler
//!
//! Command line entry point: validates firewall configuration directories
//! and packages deployment assets.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use nfw_reconciler::assets::AssetPackager;
use nfw_reconciler::client::HttpFirewallClient;
use nfw_reconciler::config::Config;
use nfw_reconciler::error::AppError;
use nfw_reconciler::logging::init_tracing;
use nfw_reconciler::telemetry::collector_from_config;
use nfw_reconciler::validation::{ConfigGraphValidator, FsConfigReader};

/// nfw-reconciler - Network firewall configuration reconciler
#[derive(Parser, Debug)]
#[command(name = "nfw-reconciler")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "NFW_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the firewall configuration directory
    Validate {
        /// Directory holding the firewall files
        #[arg(short, long, env = "NFW_FIREWALL_DIRECTORY")]
        dir: Option<PathBuf>,
    },
    /// Zip asset folders and move the archives to an output directory
    PackageAssets {
        /// Directory containing asset.* folders
        #[arg(env = "NFW_ASSET_INPUT")]
        input: PathBuf,
        /// Directory receiving the archives
        #[arg(env = "NFW_ASSET_OUTPUT")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args)?;

    init_tracing(&config.logging.level, &config.logging.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting nfw-reconciler"
    );

    match args.command {
        Command::Validate { dir } => {
            if let Some(dir) = dir {
                config.validation.firewall_directory = dir;
            }
            run_validate(&config).await?;
            Ok(())
        }
        Command::PackageAssets { input, output } => {
            let moved = AssetPackager::package(&input, &output)
                .await
                .map_err(|e| {
                    error!(error = %e, "Asset packaging failed");
                    e
                })?;
            info!(count = moved.len(), output = %output.display(), "Assets packaged");
            Ok(())
        }
    }
}

async fn run_validate(config: &Config) -> Result<(), AppError> {
    let client = HttpFirewallClient::new(&config.remote)?;
    let reader =
        FsConfigReader::from_current_dir().map_err(|e| AppError::Internal(e.to_string()))?;
    let directory = config.validation.resolve_directory(reader.base_dir());
    let telemetry = collector_from_config(&config.metrics);

    let validator = ConfigGraphValidator::new(client, reader, telemetry);
    let report = validator.validate(&directory).await?;

    info!(
        files_checked = report.files_checked,
        firewalls = report.metrics.number_of_firewalls,
        "Validation succeeded"
    );
    Ok(())
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e)),
    }
}
