// End-to-end tests: StandaloneHandler served over a real WebSocket listener

use gateway::handler::StandaloneHandler;

use gateway_core::{ConnectionRegistry, GatewayConfig, GatewayServerHandle, start_gateway_server};

use models::{OutboundEnvelope, OutboundTag};

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_standalone() -> GatewayServerHandle {
    let mut config = GatewayConfig::default();
    config.server.port = 0;
    let handler = Arc::new(StandaloneHandler::new().expect("Failed to build handler"));
    start_gateway_server(&config, handler, ConnectionRegistry::new())
        .await
        .expect("Failed to start gateway server")
}

async fn connect(handle: &GatewayServerHandle) -> Client {
    let url = format!("ws://{}", handle.local_addr());
    let (ws, _) = connect_async(&url).await.expect("Failed to connect");
    ws
}

async fn send(ws: &mut Client, request_id: &str, message_type: &str, data: &str) {
    let text = serde_json::json!({
        "requestID": request_id,
        "type": message_type,
        "data": data,
    })
    .to_string();
    ws.send(Message::text(text)).await.expect("Failed to send");
}

async fn receive(ws: &mut Client) -> OutboundEnvelope {
    let message = tokio::time::timeout(RECEIVE_TIMEOUT, ws.next())
        .await
        .expect("Timed out waiting for a message")
        .expect("No message received")
        .expect("Error receiving message");

    match message {
        Message::Text(text) => OutboundEnvelope::parse(text.as_str()).expect("Bad envelope"),
        other => panic!("Expected a text frame, got {other:?}"),
    }
}

/// **VALUE**: A client can fetch a script through the running executable's handler.
///
/// **WHY THIS MATTERS**: This is the full path a browser takes: greeting,
/// RUN_SCRIPT, HTTP fetch, SCRIPT_FETCHED back on the same request ID.
///
/// **BUG THIS CATCHES**: Would catch the handler not being wired into dispatch,
/// or the reply losing its request ID on the way out.
#[tokio::test]
async fn given_hosted_script_when_client_runs_it_then_script_fetched_arrives() {
    // GIVEN: A hosted script and a connected client
    let scripts = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/demo.py"))
        .respond_with(ResponseTemplate::new(200).set_body_string("run()"))
        .mount(&scripts)
        .await;
    let handle = start_standalone().await;
    let mut ws = connect(&handle).await;
    assert_eq!(receive(&mut ws).await.message_type, OutboundTag::ClientId);

    // WHEN: Running the script
    send(&mut ws, "r1", "RUN_SCRIPT", &format!("{}/demo.py", scripts.uri())).await;

    // THEN: SCRIPT_FETCHED with the body
    let reply = receive(&mut ws).await;
    assert_eq!(reply.message_type, OutboundTag::ScriptFetched);
    assert_eq!(reply.request_id.as_deref(), Some("r1"));
    assert_eq!(reply.message, "run()");

    handle.shutdown().await;
}

#[tokio::test]
async fn given_failing_script_host_when_client_runs_it_then_error_is_reported() {
    // GIVEN: A host that answers 500
    let scripts = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&scripts)
        .await;
    let handle = start_standalone().await;
    let mut ws = connect(&handle).await;
    receive(&mut ws).await;

    // WHEN: Running the script
    send(&mut ws, "r2", "RUN_SCRIPT", &format!("{}/broken.py", scripts.uri())).await;

    // THEN: ERROR for the request, connection still answers
    let reply = receive(&mut ws).await;
    assert_eq!(reply.message_type, OutboundTag::Error);
    assert_eq!(reply.request_id.as_deref(), Some("r2"));
    assert!(reply.message.contains("500"));

    send(&mut ws, "r3", "EXPERIMENT_STATUS", "ping").await;
    let echo = receive(&mut ws).await;
    assert_eq!(echo.message_type, OutboundTag::ExperimentStatus);
    assert_eq!(echo.message, "ping");

    handle.shutdown().await;
}

#[tokio::test]
async fn given_standalone_server_when_unimplemented_command_sent_then_no_feature() {
    // GIVEN: A connected client
    let handle = start_standalone().await;
    let mut ws = connect(&handle).await;
    receive(&mut ws).await;

    // WHEN: IDLE_USER (no reply) followed by SAVE_PROJECT (unsupported)
    send(&mut ws, "a", "IDLE_USER", "").await;
    send(&mut ws, "b", "SAVE_PROJECT", "{\"projectId\":1}").await;

    // THEN: The only reply is NO_FEATURE for the save
    let reply = receive(&mut ws).await;
    assert_eq!(reply.message_type, OutboundTag::NoFeature);
    assert_eq!(reply.request_id.as_deref(), Some("b"));

    handle.shutdown().await;
}
