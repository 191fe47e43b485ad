//! Where the gateway keeps its configuration and logs.
//!
//! Lookup order for the configuration directory:
//! 1. `GATEWAY_CONFIG_DIR` environment variable
//! 2. Platform config directory via `dirs` (e.g. `~/.config/sim-gateway`)
//!
//! Logs go to `logging.log_dir` when configured, otherwise to `logs/` under
//! the configuration directory.

use crate::error::GatewayError;

use common::ErrorLocation;

use gateway_core::config::LoggingConfig;

use std::env;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info};

pub const CONFIG_DIR_ENV_VAR: &str = "GATEWAY_CONFIG_DIR";
pub const APP_DIR_NAME: &str = "sim-gateway";
const LOG_DIR_NAME: &str = "logs";

/// How the configuration directory was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    EnvVar,
    PlatformDefault,
}

impl Display for PathSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            PathSource::EnvVar => write!(f, "{CONFIG_DIR_ENV_VAR}"),
            PathSource::PlatformDefault => write!(f, "platform default"),
        }
    }
}

/// Resolve the configuration directory from the environment.
///
/// # Errors
///
/// Returns [`GatewayError::Gateway`] if neither the override nor a platform
/// config directory is available.
pub fn config_dir() -> Result<(PathBuf, PathSource), GatewayError> {
    config_dir_from(env::var(CONFIG_DIR_ENV_VAR).ok(), dirs::config_dir())
}

/// Resolve the configuration directory from an explicit override and a
/// platform base directory.
#[track_caller]
pub fn config_dir_from(
    override_dir: Option<String>,
    platform_dir: Option<PathBuf>,
) -> Result<(PathBuf, PathSource), GatewayError> {
    if let Some(custom) = override_dir.filter(|dir| !dir.trim().is_empty()) {
        info!("Using {CONFIG_DIR_ENV_VAR} override: {custom}");
        return Ok((PathBuf::from(custom), PathSource::EnvVar));
    }

    match platform_dir {
        Some(base) => {
            let dir = base.join(APP_DIR_NAME);
            debug!("Platform config dir: {:?}", dir);
            Ok((dir, PathSource::PlatformDefault))
        }
        None => Err(GatewayError::Gateway {
            message: format!(
                "No config directory found; set {CONFIG_DIR_ENV_VAR} to choose one"
            ),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

/// Directory the log file is written to.
pub fn log_dir(config_dir: &Path, logging: &LoggingConfig) -> PathBuf {
    logging
        .log_dir
        .clone()
        .unwrap_or_else(|| config_dir.join(LOG_DIR_NAME))
}
