//! Vaultwatch - Entry Point

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, warn};

/// Vault event alerting service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via VAULTWATCH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > VAULTWATCH_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("VAULTWATCH_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    // Loaded before logging so the configured level applies
    let config = vault_bot::AppConfig::load(&config_path)?;

    vault_telemetry::init_logging(config.telemetry.log_level.as_deref())?;

    info!("Starting vaultwatch v{}", env!("CARGO_PKG_VERSION"));
    if Path::new(&config_path).exists() {
        info!(config_path = %config_path, "Configuration loaded");
    } else {
        warn!(config_path = %config_path, "Config file not found, using defaults and environment");
    }

    config.validate()?;
    info!(
        mode = ?config.effective_mode(),
        log_path = %config.source.log_path.display(),
        "Configuration validated"
    );

    let app = vault_bot::Application::new(config)?;
    app.run().await?;

    info!("Shutdown complete");
    Ok(())
}
