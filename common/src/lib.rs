//! Primitives shared by every crate in the gateway workspace.
//!
//! - [`ErrorLocation`]: source location captured at the error site
//! - [`RedactedKey`]: secret string that never reaches logs or the wire

pub mod error;
pub mod redacted_key;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_key::RedactedKey;
