//! The write side of a client socket.
//!
//! A [`Transport`] delivers whole frames: a text frame or a binary frame is
//! written as one unit, never interleaved with another writer's frame.

mod channel;
mod websocket;

pub use channel::{ChannelTransport, TransportFrame};
pub use websocket::WebSocketTransport;

use crate::error::TransportError;

use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one text frame.
    async fn write_text(&self, text: String) -> Result<(), TransportError>;

    /// Write one binary frame.
    async fn write_binary(&self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Close the underlying socket. Closing twice is not an error.
    async fn close(&self) -> Result<(), TransportError>;
}
