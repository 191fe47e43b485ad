//! Client connections: lifecycle, command dispatch and the registry of live
//! connections.

mod dispatch;
mod registry;
mod session;

pub use registry::ConnectionRegistry;
pub use session::Connection;

use crate::config::MessagingConfig;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::time::Duration;

/// Why a connection was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// The client closed the socket or it reached EOF.
    ClientClosed,
    /// Reading from the socket failed.
    ReadError,
    /// The outbound writer failed to write a text frame.
    TransportFailure,
    /// Reading or writing a file transfer failed.
    BinarySendFailure,
    /// The server is shutting down.
    ServerShutdown,
}

impl CloseReason {
    /// Failures leave the socket unusable, so nothing is drained on close.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CloseReason::ReadError | CloseReason::TransportFailure | CloseReason::BinarySendFailure
        )
    }
}

impl Display for CloseReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let reason = match self {
            CloseReason::ClientClosed => "client closed",
            CloseReason::ReadError => "read error",
            CloseReason::TransportFailure => "transport failure",
            CloseReason::BinarySendFailure => "binary send failure",
            CloseReason::ServerShutdown => "server shutdown",
        };
        formatter.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Open,
    Closed(CloseReason),
}

impl ConnectionStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionStatus::Closed(_))
    }
}

/// Per-connection delivery settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Flush queued text before shutting the sender down on a clean close.
    pub drain_on_close: bool,
    /// Upper bound on that flush.
    pub flush_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        MessagingConfig::default().into()
    }
}

impl From<&MessagingConfig> for ConnectionOptions {
    fn from(config: &MessagingConfig) -> Self {
        Self {
            drain_on_close: config.drain_on_close,
            flush_timeout: config.flush_timeout(),
        }
    }
}

impl From<MessagingConfig> for ConnectionOptions {
    fn from(config: MessagingConfig) -> Self {
        Self::from(&config)
    }
}
