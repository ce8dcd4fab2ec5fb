//! assessor-sync binary
//!
//! ```text
//! assessor-sync [--config <file>] [PIN ...]
//! ```
//! With no PINs the registry supplies them. The batch summary is printed to
//! stdout as JSON; logs go to stderr and the log file.

#![allow(missing_docs)]

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tracing::info;

use assessor_sync_lib::application::{AssessorPageFetcher, PinSupplier, SyncService};
use assessor_sync_lib::infrastructure::logging::log_system_info;
use assessor_sync_lib::infrastructure::{
    ConfigManager, DatabaseConnection, DetailExtractor, RegistryRepository, RetryPolicy,
    SqliteConnectionFactory, init_logging_with_config,
};

struct CliArgs {
    config_path: Option<PathBuf>,
    pins: Vec<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut config_path = None;
    let mut pins = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a file path")?;
                config_path = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => bail!("Unknown option: {flag}"),
            _ => pins.push(arg),
        }
    }

    Ok(CliArgs { config_path, pins })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args(std::env::args().skip(1))?;

    let manager = match cli.config_path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let config = manager.load_config().await?;

    init_logging_with_config(config.logging.clone())?;
    log_system_info();
    info!("Configuration: {:?}", manager.config_path());

    let db = DatabaseConnection::with_max_connections(
        &config.database.url,
        config.database.max_connections,
    )
    .await?;
    if config.database.auto_migrate {
        db.migrate().await?;
    }

    let supplier = if cli.pins.is_empty() {
        PinSupplier::from_registry(&RegistryRepository::new(db.pool().clone())).await?
    } else {
        PinSupplier::from_args(&cli.pins)
    };

    let service = SyncService::new(
        AssessorPageFetcher::new(&config.assessor)?,
        DetailExtractor::new()?,
    );
    let factory = SqliteConnectionFactory::from_url(&config.database.url)?;

    let summary = service
        .run(&supplier.padded(), factory, RetryPolicy::from(&config.writer))
        .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
