//! droidctl - Android SDK & AVD manager
//!
//! CLI entry point: initializes logging, loads configuration and
//! dispatches to the AVD and SDK commands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::{AvdAction, AvdCommand, SdkAction, SdkCommand};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "droidctl")]
#[command(about = "Manage local Android SDK installations and AVDs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage Android Virtual Devices
    Avd {
        #[command(subcommand)]
        action: AvdAction,
    },
    /// Manage the SDK installation
    Sdk {
        #[command(subcommand)]
        action: SdkAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("droidctl v{} starting", VERSION);

    let cli = Cli::parse();

    let config = droidctl_core::AppConfig::load().await?;
    if let Some(sdk_root) = config.sdk.resolved_sdk_root() {
        info!("Using Android SDK at {:?}", sdk_root);
    } else {
        info!("Android SDK path not configured");
    }

    match cli.command {
        Commands::Avd { action } => AvdCommand { action }.execute(&config).await,
        Commands::Sdk { action } => SdkCommand { action }.execute(&config).await,
    }
}
