use common::ErrorLocation;

use models::InboundTag;

use thiserror::Error as ThisError;

/// Failures raised by a [`CommandHandler`](crate::handler::CommandHandler).
#[derive(Debug, ThisError)]
pub enum HandlerError {
    #[error("Execution Error: {message} {location}")]
    Execution {
        message: String,
        location: ErrorLocation,
    },

    #[error("Initialization Error: {message} {location}")]
    Initialization {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unsupported Command Error: {command} {location}")]
    Unsupported {
        command: InboundTag,
        location: ErrorLocation,
    },
}

impl HandlerError {
    /// Reason text without the source location.
    pub fn reason(&self) -> String {
        match self {
            HandlerError::Execution { message, .. } | HandlerError::Initialization { message, .. } => {
                message.clone()
            }
            HandlerError::Unsupported { command, .. } => {
                format!("{command} is not supported by this server")
            }
        }
    }
}
