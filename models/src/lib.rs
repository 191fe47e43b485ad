//! Wire-level data for the simulation front-end protocol.
//!
//! This crate contains pure data structures: the JSON envelopes exchanged on
//! the text channel, the command and outbound tag enumerations, and the typed
//! [`Command`] union decoded from an inbound envelope. It has no I/O and no
//! async code.
//!
//! ## Architecture
//!
//! - **models** (this crate): envelopes, tags, commands
//! - **gateway-core**: connections, dispatch, message delivery, framing
//! - **gateway**: the executable wiring everything together

pub mod command;
pub mod connection_id;
pub mod envelope;
pub mod error;

pub use command::{Command, DownloadRequest, ExperimentRef, InstanceQuery, UploadRequest};
pub use connection_id::ConnectionId;
pub use envelope::{InboundEnvelope, InboundTag, OutboundEnvelope, OutboundTag};
pub use error::command_error::CommandError;
pub use error::model_error::ModelError;
