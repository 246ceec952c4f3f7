//! NAS Manager - Main entry point
//!
//! Command-line administration for TrueNAS SCALE.

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use nas_manager::{config::Config, utils, NasError, TrueNasClient};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: ~/.truenas/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Snapshot management
    #[command(subcommand)]
    Snapshot(cmd::snapshot::SnapshotCommand),

    /// Replication task management
    #[command(subcommand)]
    Replication(cmd::replication::ReplicationCommand),

    /// Dataset management
    #[command(subcommand)]
    Dataset(cmd::dataset::DatasetCommand),

    /// Storage pools
    #[command(subcommand)]
    Pool(cmd::pool::PoolCommand),

    /// Alerts, services and disks
    #[command(subcommand)]
    Health(cmd::health::HealthCommand),

    /// System information
    #[command(subcommand)]
    System(cmd::system::SystemCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::debug!("nas-manager v{} using {}", env!("CARGO_PKG_VERSION"), config.truenas.base_url());

    let client = TrueNasClient::new(&config.truenas)?;

    let result = match args.command {
        Command::Snapshot(command) => cmd::snapshot::run(&client, &config, command).await,
        Command::Replication(command) => cmd::replication::run(&client, &config, command).await,
        Command::Dataset(command) => cmd::dataset::run(&client, command).await,
        Command::Pool(command) => cmd::pool::run(&client, command).await,
        Command::Health(command) => cmd::health::run(&client, command).await,
        Command::System(command) => cmd::system::run(&client, command).await,
    };

    if let Err(e) = &result {
        if e.downcast_ref::<NasError>().is_some_and(NasError::is_remote) {
            tracing::error!(url = %client.base_url(), "TrueNAS request failed");
        }
    }
    result
}
