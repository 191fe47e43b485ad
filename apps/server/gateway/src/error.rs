use common::ErrorLocation;

use gateway_core::error::{ConfigError, ServerError};

use thiserror::Error;

/// Errors that stop the gateway executable from starting or running.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Error from this App
    #[error("Gateway Error: {message} {location}")]
    Gateway {
        message: String,
        location: ErrorLocation,
    },

    /// Configuration could not be loaded or failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The listener could not be started
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The HTTP client used by the standalone handler could not be built
    #[error("HTTP Client Error: {message} {location}")]
    HttpClient {
        message: String,
        location: ErrorLocation,
    },
}
