use crate::error::TransportError;
use crate::transport::Transport;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// A frame as seen by the peer of a [`ChannelTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFrame {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

/// In-memory transport that hands every written frame to a channel.
///
/// Cloned handles share the same channel and failure switch, so a test can
/// keep one clone and break the "socket" while a connection owns another.
#[derive(Clone)]
pub struct ChannelTransport {
    frames: UnboundedSender<TransportFrame>,
    failing: Arc<AtomicBool>,
}

impl ChannelTransport {
    pub fn new() -> (Self, UnboundedReceiver<TransportFrame>) {
        let (frames, receiver) = unbounded_channel();
        let transport = Self {
            frames,
            failing: Arc::new(AtomicBool::new(false)),
        };
        (transport, receiver)
    }

    /// Make every following write fail (or succeed again).
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[track_caller]
    fn deliver(&self, frame: TransportFrame) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Write {
                message: "simulated write failure".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.frames.send(frame).map_err(|_| TransportError::Closed {
            message: "frame receiver dropped".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn write_text(&self, text: String) -> Result<(), TransportError> {
        self.deliver(TransportFrame::Text(text))
    }

    async fn write_binary(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.deliver(TransportFrame::Binary(bytes))
    }

    async fn close(&self) -> Result<(), TransportError> {
        // The peer may already be gone; closing is best effort.
        let _ = self.frames.send(TransportFrame::Close);
        Ok(())
    }
}
