//! WebSocket termination for client connections.
//!
//! The server accepts TCP connections, upgrades them to WebSocket and opens a
//! [`Connection`](crate::connection::Connection) per client. Each connection
//! runs its own read loop on its own task:
//!
//! - text frames are dispatched through `Connection::on_text`
//! - binary frames are rejected (logged) without closing the connection
//! - close frames, EOF and read errors close the connection
//!
//! # Protocol
//!
//! JSON text envelopes both ways, plus binary file-transfer frames from server
//! to client. See the `models` crate for the envelope types and
//! [`framing`](crate::framing) for the binary layout.

mod handle;
mod listener;

pub use handle::GatewayServerHandle;
pub use listener::start_gateway_server;
