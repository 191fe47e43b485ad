//! Test helpers for gateway server integration tests.
//!
//! - Starting a server on an ephemeral port
//! - Connecting and exchanging JSON envelopes
//! - Waiting for registry changes

use gateway_core::error::ServerError;
use gateway_core::handler::HandlerResult;
use gateway_core::{
    CommandContext, CommandHandler, ConnectionRegistry, GatewayConfig, GatewayServerHandle,
    HandlerReply, start_gateway_server,
};

use models::{OutboundEnvelope, OutboundTag};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const TEST_VERSION: &str = "test-1.0";
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Answers GEPPETTO_VERSION and nothing else.
pub struct VersionHandler;

#[async_trait]
impl CommandHandler for VersionHandler {
    async fn geppetto_version(&self, _ctx: &CommandContext) -> HandlerResult {
        Ok(HandlerReply::message(OutboundTag::GeppettoVersion, TEST_VERSION))
    }
}

/// Test helper: Start a server on 127.0.0.1 with an OS-assigned port.
pub async fn start_test_server() -> Result<GatewayServerHandle, ServerError> {
    let mut config = GatewayConfig::default();
    config.server.port = 0;
    config.server.loopback_only = true;
    config.messaging.flush_timeout_ms = 200;
    start_gateway_server(&config, Arc::new(VersionHandler), ConnectionRegistry::new()).await
}

/// Test helper: Connect to the server and return the WebSocket stream.
pub async fn connect_to_server(handle: &GatewayServerHandle) -> Client {
    let url = format!("ws://{}", handle.local_addr());
    let (ws_stream, _) = connect_async(&url)
        .await
        .expect("Failed to connect to WebSocket server");
    ws_stream
}

/// Test helper: Send one inbound envelope as a text frame.
pub async fn send_envelope(ws: &mut Client, request_id: &str, message_type: &str, data: &str) {
    let text = serde_json::json!({
        "requestID": request_id,
        "type": message_type,
        "data": data,
    })
    .to_string();
    ws.send(Message::text(text))
        .await
        .expect("Failed to send message");
}

/// Test helper: Receive the next frame and decode it as an outbound envelope.
pub async fn receive_envelope(ws: &mut Client) -> OutboundEnvelope {
    let message = tokio::time::timeout(RECEIVE_TIMEOUT, ws.next())
        .await
        .expect("Timed out waiting for a message")
        .expect("No message received")
        .expect("Error receiving message");

    match message {
        Message::Text(text) => {
            OutboundEnvelope::parse(text.as_str()).expect("Failed to decode envelope")
        }
        other => panic!("Expected a text frame, got {other:?}"),
    }
}

/// Test helper: Check if the WebSocket connection is closed.
pub async fn is_connection_closed(ws: &mut Client) -> bool {
    match tokio::time::timeout(RECEIVE_TIMEOUT, ws.next()).await {
        Err(_) => false,
        Ok(None) => true,
        Ok(Some(Ok(Message::Close(_)))) => true,
        Ok(Some(Ok(_))) => false,
        Ok(Some(Err(_))) => true,
    }
}

/// Test helper: Wait until the registry holds `expected` connections.
pub async fn wait_for_registry_len(handle: &GatewayServerHandle, expected: usize) {
    tokio::time::timeout(RECEIVE_TIMEOUT, async {
        while handle.registry().len().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("registry did not reach the expected size");
}
