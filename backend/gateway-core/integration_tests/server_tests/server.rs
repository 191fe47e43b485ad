use crate::server_tests::helpers::{
    TEST_VERSION, connect_to_server, is_connection_closed, receive_envelope, send_envelope,
    start_test_server, wait_for_registry_len,
};

use models::{ConnectionId, OutboundTag};

use futures_util::SinkExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// **VALUE**: A connecting client is greeted with its ID before anything else.
///
/// **WHY THIS MATTERS**: The client stores this ID and echoes it in later HTTP
/// calls; without it no session can start.
///
/// **BUG THIS CATCHES**: Would catch a server that waits for the first client
/// message before greeting, or registers the connection under another ID.
#[tokio::test]
async fn given_running_server_when_client_connects_then_client_id_is_first_message() {
    // GIVEN: A running server
    let handle = start_test_server()
        .await
        .expect("Failed to start gateway server");

    // WHEN: A client connects
    let mut ws = connect_to_server(&handle).await;

    // THEN: The first message is CLIENT_ID with no request ID, and it is registered
    let greeting = receive_envelope(&mut ws).await;
    assert_eq!(greeting.message_type, OutboundTag::ClientId);
    assert_eq!(greeting.request_id, None);
    let id = ConnectionId::from(greeting.message.as_str());
    assert!(handle.registry().contains(&id).await);

    handle.shutdown().await;
}

/// **VALUE**: A request round-trips through dispatch and back with its ID.
#[tokio::test]
async fn given_connected_client_when_requesting_version_then_reply_carries_request_id() {
    // GIVEN: A connected client past the greeting
    let handle = start_test_server()
        .await
        .expect("Failed to start gateway server");
    let mut ws = connect_to_server(&handle).await;
    receive_envelope(&mut ws).await;

    // WHEN: Asking for the version
    send_envelope(&mut ws, "42", "GEPPETTO_VERSION", "").await;

    // THEN: GEPPETTO_VERSION reply correlated by request ID
    let reply = receive_envelope(&mut ws).await;
    assert_eq!(reply.message_type, OutboundTag::GeppettoVersion);
    assert_eq!(reply.request_id.as_deref(), Some("42"));
    assert_eq!(reply.message, TEST_VERSION);

    handle.shutdown().await;
}

/// **VALUE**: A bad script URL is reported on the wire as ERROR_READING_SCRIPT.
#[tokio::test]
async fn given_malformed_script_url_when_sent_then_error_reading_script() {
    // GIVEN: A connected client
    let handle = start_test_server()
        .await
        .expect("Failed to start gateway server");
    let mut ws = connect_to_server(&handle).await;
    receive_envelope(&mut ws).await;

    // WHEN: RUN_SCRIPT with something that is not a URL
    send_envelope(&mut ws, "9", "RUN_SCRIPT", "not a url").await;

    // THEN: ERROR_READING_SCRIPT for that request
    let reply = receive_envelope(&mut ws).await;
    assert_eq!(reply.message_type, OutboundTag::ErrorReadingScript);
    assert_eq!(reply.request_id.as_deref(), Some("9"));

    handle.shutdown().await;
}

/// **VALUE**: Rejected inbound traffic does not cost the client its session.
///
/// **BUG THIS CATCHES**: Would catch a read loop that closes the socket on a
/// binary frame, an unknown command or malformed JSON.
#[tokio::test]
async fn given_unsupported_inbound_when_sent_then_connection_stays_usable() {
    // GIVEN: A connected client
    let handle = start_test_server()
        .await
        .expect("Failed to start gateway server");
    let mut ws = connect_to_server(&handle).await;
    receive_envelope(&mut ws).await;

    // WHEN: Sending a binary frame, garbage text and an unknown command
    ws.send(Message::binary(vec![1u8, 2, 3]))
        .await
        .expect("Failed to send binary frame");
    ws.send(Message::text("{not json".to_string()))
        .await
        .expect("Failed to send text frame");
    send_envelope(&mut ws, "1", "TELEPORT", "").await;
    send_envelope(&mut ws, "2", "GEPPETTO_VERSION", "").await;

    // THEN: The only reply is the version, and the connection is still registered
    let reply = receive_envelope(&mut ws).await;
    assert_eq!(reply.message_type, OutboundTag::GeppettoVersion);
    assert_eq!(reply.request_id.as_deref(), Some("2"));
    assert_eq!(handle.registry().len().await, 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn given_unimplemented_command_when_sent_then_no_feature() {
    // GIVEN: A connected client
    let handle = start_test_server()
        .await
        .expect("Failed to start gateway server");
    let mut ws = connect_to_server(&handle).await;
    receive_envelope(&mut ws).await;

    // WHEN: Sending a command the handler does not implement
    send_envelope(&mut ws, "5", "IDLE_USER", "").await;

    // THEN: NO_FEATURE
    let reply = receive_envelope(&mut ws).await;
    assert_eq!(reply.message_type, OutboundTag::NoFeature);
    assert_eq!(reply.request_id.as_deref(), Some("5"));

    handle.shutdown().await;
}

/// **VALUE**: A client disconnect removes its registry entry.
#[tokio::test]
async fn given_connected_client_when_it_disconnects_then_registry_is_emptied() {
    // GIVEN: A connected client
    let handle = start_test_server()
        .await
        .expect("Failed to start gateway server");
    let mut ws = connect_to_server(&handle).await;
    receive_envelope(&mut ws).await;
    wait_for_registry_len(&handle, 1).await;

    // WHEN: The client closes
    ws.close(None).await.expect("Failed to close");

    // THEN: The server deregisters it
    wait_for_registry_len(&handle, 0).await;

    handle.shutdown().await;
}

/// **VALUE**: Server shutdown closes every client and stops accepting.
///
/// **BUG THIS CATCHES**: Would catch a shutdown that only stops the accept
/// loop and leaves existing sockets open.
#[tokio::test]
async fn given_connected_clients_when_server_shuts_down_then_clients_see_close() {
    // GIVEN: Two connected clients
    let handle = start_test_server()
        .await
        .expect("Failed to start gateway server");
    let mut first = connect_to_server(&handle).await;
    let mut second = connect_to_server(&handle).await;
    receive_envelope(&mut first).await;
    receive_envelope(&mut second).await;
    wait_for_registry_len(&handle, 2).await;

    // WHEN: Shutting down
    handle.shutdown().await;

    // THEN: Both clients see the close, registry empty, new connections refused
    assert!(is_connection_closed(&mut first).await);
    assert!(is_connection_closed(&mut second).await);
    assert!(handle.registry().is_empty().await);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let url = format!("ws://{}", handle.local_addr());
    assert!(connect_async(&url).await.is_err());
}
