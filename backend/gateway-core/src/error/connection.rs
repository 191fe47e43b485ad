use crate::error::{FramingError, TransportError};

use common::ErrorLocation;

use models::{ConnectionId, ModelError};

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("Malformed Envelope Error: {message} {location}")]
    MalformedEnvelope {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unsupported Operation Error: {message} {location}")]
    UnsupportedOperation {
        message: String,
        location: ErrorLocation,
    },

    #[error("Connection Closed Error: {connection_id} {location}")]
    Closed {
        connection_id: ConnectionId,
        location: ErrorLocation,
    },

    #[error("Open Error: {message} {location}")]
    Open {
        message: String,
        location: ErrorLocation,
    },

    #[error("File Read Error: {message} {location}")]
    FileRead {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<ModelError> for ConnectionError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        ConnectionError::MalformedEnvelope {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<IoError> for ConnectionError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        ConnectionError::FileRead {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
