use crate::InboundTag;

use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failure to extract a command's parameters from the envelope `data` field.
///
/// `message` holds the bare reason; it is what gets sent back to the client.
#[derive(Debug, ThisError)]
pub enum CommandError {
    #[error("Missing Parameter Error: {message} {location}")]
    MissingParameter {
        command: InboundTag,
        parameter: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Parameter Error: {message} {location}")]
    InvalidParameter {
        command: InboundTag,
        parameter: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("Malformed Parameters Error: {message} {location}")]
    MalformedParameters {
        command: InboundTag,
        message: String,
        location: ErrorLocation,
    },

    #[error("Malformed URL Error: {message} {location}")]
    MalformedUrl {
        command: InboundTag,
        url: String,
        message: String,
        location: ErrorLocation,
    },
}

impl CommandError {
    /// The command whose parameters failed to decode.
    pub fn command(&self) -> InboundTag {
        match self {
            CommandError::MissingParameter { command, .. }
            | CommandError::InvalidParameter { command, .. }
            | CommandError::MalformedParameters { command, .. }
            | CommandError::MalformedUrl { command, .. } => *command,
        }
    }

    /// Reason text without the source location.
    pub fn reason(&self) -> &str {
        match self {
            CommandError::MissingParameter { message, .. }
            | CommandError::InvalidParameter { message, .. }
            | CommandError::MalformedParameters { message, .. }
            | CommandError::MalformedUrl { message, .. } => message,
        }
    }
}
