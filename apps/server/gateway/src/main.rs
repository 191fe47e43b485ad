use gateway::error::GatewayError;
use gateway::handler::StandaloneHandler;
use gateway::logger::{initialize as LoggerInitialize, parse_level};
use gateway::paths;

use gateway_core::{ConnectionRegistry, GatewayConfig, start_gateway_server};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::sync::Arc;

use log::{info, warn};

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    // Optional; a missing .env is fine
    let dotenv = dotenvy::dotenv();

    let (config_dir, source) = paths::config_dir()?;
    let mut config = GatewayConfig::load(&config_dir)?;
    config.apply_env_overrides()?;

    let log_dir = paths::log_dir(&config_dir, &config.logging);
    create_dir_all(&log_dir).map_err(|e| GatewayError::Gateway {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir, parse_level(&config.logging.level)?)?;

    info!("Simulation gateway starting");
    info!("Config directory: {} ({source})", config_dir.display());
    info!("Log directory: {}", log_dir.display());
    if let Ok(path) = dotenv {
        info!("Loaded .env from: {:?}", path);
    }

    let handler = Arc::new(StandaloneHandler::new()?);
    let handle = start_gateway_server(&config, handler, ConnectionRegistry::new()).await?;

    info!("Gateway ready on ws://{}", handle.local_addr());

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C, shutting down: {e}");
    }

    info!("Shutting down");
    handle.shutdown().await;

    Ok(())
}
