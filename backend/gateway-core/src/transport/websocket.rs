use crate::error::TransportError;
use crate::transport::Transport;

use async_trait::async_trait;
use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Write half of an accepted WebSocket connection.
pub struct WebSocketTransport {
    write: Mutex<WsSink>,
}

impl WebSocketTransport {
    pub fn new(write: WsSink) -> Self {
        Self {
            write: Mutex::new(write),
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn write_text(&self, text: String) -> Result<(), TransportError> {
        let mut write = self.write.lock().await;
        write.send(Message::text(text)).await?;
        Ok(())
    }

    async fn write_binary(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        let mut write = self.write.lock().await;
        write.send(Message::binary(bytes)).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut write = self.write.lock().await;
        match write.close().await {
            Ok(()) => Ok(()),
            Err(e) => match TransportError::from(e) {
                TransportError::Closed { .. } => Ok(()),
                other => Err(other),
            },
        }
    }
}
