//! Binary file-transfer frame.
//!
//! ```text
//! byte 0      frame kind (1 = file transfer)
//! byte 1      N = byte length of the UTF-8 file name
//! 2..2+N      file name
//! 2+N..       file content (remainder of the message)
//! ```
//!
//! The content has no length field, so the transport must deliver each frame
//! as a single message.

use crate::error::FramingError;

use common::ErrorLocation;

use std::panic::Location;

pub const FRAME_KIND_FILE: u8 = 1;
pub const MAX_NAME_LENGTH: usize = u8::MAX as usize;

const HEADER_LENGTH: usize = 2;

/// Build a file-transfer frame.
///
/// # Errors
///
/// Returns [`FramingError::NameTooLong`] if `name` is longer than 255 bytes.
#[track_caller]
pub fn encode(name: &str, payload: &[u8]) -> Result<Vec<u8>, FramingError> {
    let name_bytes = name.as_bytes();
    let name_length = name_length(name)?;

    let mut frame = Vec::with_capacity(HEADER_LENGTH + name_bytes.len() + payload.len());
    frame.push(FRAME_KIND_FILE);
    frame.push(name_length);
    frame.extend_from_slice(name_bytes);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// The length byte for `name`.
///
/// # Errors
///
/// Returns [`FramingError::NameTooLong`] if `name` is longer than 255 bytes.
#[track_caller]
pub fn name_length(name: &str) -> Result<u8, FramingError> {
    u8::try_from(name.len()).map_err(|_| FramingError::NameTooLong {
        length: name.len(),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Split a file-transfer frame back into its name and content.
///
/// # Errors
///
/// - [`FramingError::Truncated`] if the frame is shorter than its header says
/// - [`FramingError::UnknownKind`] if byte 0 is not [`FRAME_KIND_FILE`]
/// - [`FramingError::InvalidName`] if the name is not UTF-8
#[track_caller]
pub fn decode(frame: &[u8]) -> Result<(String, Vec<u8>), FramingError> {
    let [kind, name_length, rest @ ..] = frame else {
        return Err(FramingError::Truncated {
            message: format!("frame has {} bytes, header needs {HEADER_LENGTH}", frame.len()),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    if *kind != FRAME_KIND_FILE {
        return Err(FramingError::UnknownKind {
            kind: *kind,
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let name_length = usize::from(*name_length);
    if rest.len() < name_length {
        return Err(FramingError::Truncated {
            message: format!(
                "name needs {name_length} bytes but only {} remain",
                rest.len()
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let (name, payload) = rest.split_at(name_length);
    let name = std::str::from_utf8(name).map_err(|e| FramingError::InvalidName {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    Ok((name.to_string(), payload.to_vec()))
}
