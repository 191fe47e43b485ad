use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum FramingError {
    #[error("Name Too Long Error: file name is {length} bytes (max 255) {location}")]
    NameTooLong {
        length: usize,
        location: ErrorLocation,
    },

    #[error("Truncated Frame Error: {message} {location}")]
    Truncated {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unknown Frame Kind Error: {kind} {location}")]
    UnknownKind { kind: u8, location: ErrorLocation },

    #[error("Invalid Name Error: {message} {location}")]
    InvalidName {
        message: String,
        location: ErrorLocation,
    },
}
