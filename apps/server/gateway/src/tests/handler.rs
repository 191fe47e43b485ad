// Unit tests for StandaloneHandler against a mock HTTP server

use crate::handler::StandaloneHandler;

use gateway_core::error::HandlerError;
use gateway_core::{ChannelTransport, CommandContext, CommandHandler, HandlerReply, MessageSender};

use models::{ConnectionId, OutboundTag};

use std::sync::Arc;

use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn context() -> CommandContext {
    let connection_id = ConnectionId::from("test-client");
    let (transport, _frames) = ChannelTransport::new();
    let (outbound, _signal) = MessageSender::spawn(connection_id.clone(), Arc::new(transport));
    CommandContext {
        request_id: Some(String::from("1")),
        connection_id,
        outbound,
    }
}

#[tokio::test]
async fn given_version_request_when_handled_then_reports_configured_version() {
    // GIVEN: A handler with a known version
    let handler = StandaloneHandler::with_version("9.9.9").unwrap();

    // WHEN: Asking for the version
    let reply = handler.geppetto_version(&context()).await.unwrap();

    // THEN: GEPPETTO_VERSION carrying it
    assert_eq!(
        reply,
        HandlerReply::message(OutboundTag::GeppettoVersion, "9.9.9")
    );
}

#[tokio::test]
async fn given_default_handler_when_asked_for_version_then_uses_package_version() {
    let handler = StandaloneHandler::new().unwrap();

    let reply = handler.geppetto_version(&context()).await.unwrap();

    assert_eq!(
        reply,
        HandlerReply::message(OutboundTag::GeppettoVersion, env!("CARGO_PKG_VERSION"))
    );
}

/// **VALUE**: RUN_SCRIPT returns the fetched body as SCRIPT_FETCHED.
///
/// **WHY THIS MATTERS**: The client executes whatever comes back; a truncated
/// or re-encoded body would run the wrong script.
///
/// **BUG THIS CATCHES**: Would catch replying with the URL instead of the body,
/// or using the wrong outbound tag.
#[tokio::test]
async fn given_reachable_script_when_running_then_replies_with_body() {
    // GIVEN: A server hosting a script
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scripts/setup.py"))
        .respond_with(ResponseTemplate::new(200).set_body_string("print('ready')\n"))
        .expect(1)
        .mount(&server)
        .await;
    let handler = StandaloneHandler::new().unwrap();
    let url = Url::parse(&format!("{}/scripts/setup.py", server.uri())).unwrap();

    // WHEN: Running the script
    let reply = handler.run_script(&context(), url).await.unwrap();

    // THEN: SCRIPT_FETCHED with the exact body
    assert_eq!(
        reply,
        HandlerReply::message(OutboundTag::ScriptFetched, "print('ready')\n")
    );
}

/// **VALUE**: A non-success HTTP status is an execution failure.
///
/// **BUG THIS CATCHES**: Would catch forwarding a 404 error page as the script.
#[tokio::test]
async fn given_missing_script_when_running_then_execution_error() {
    // GIVEN: A server answering 404
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;
    let handler = StandaloneHandler::new().unwrap();
    let url = Url::parse(&format!("{}/missing.py", server.uri())).unwrap();

    // WHEN: Running the script
    let result = handler.run_script(&context(), url).await;

    // THEN: Execution error naming the status
    match result {
        Err(HandlerError::Execution { message, .. }) => assert!(message.contains("404")),
        other => panic!("Expected execution error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_unreachable_host_when_running_then_execution_error() {
    // GIVEN: A URL nothing listens on
    let server = MockServer::start().await;
    let url = Url::parse(&format!("{}/script.py", server.uri())).unwrap();
    drop(server);
    let handler = StandaloneHandler::new().unwrap();

    // WHEN/THEN: The fetch fails as an execution error
    let result = handler.run_script(&context(), url).await;
    assert!(matches!(result, Err(HandlerError::Execution { .. })));
}

#[tokio::test]
async fn given_idle_user_when_handled_then_no_reply() {
    let handler = StandaloneHandler::new().unwrap();

    let reply = handler.idle_user(&context()).await.unwrap();

    assert_eq!(reply, HandlerReply::None);
}

#[tokio::test]
async fn given_experiment_status_when_handled_then_payload_is_echoed() {
    let handler = StandaloneHandler::new().unwrap();

    let reply = handler
        .experiment_status(&context(), String::from("{\"projectId\":3}"))
        .await
        .unwrap();

    assert_eq!(
        reply,
        HandlerReply::message(OutboundTag::ExperimentStatus, "{\"projectId\":3}")
    );
}

/// **VALUE**: Commands the standalone server does not implement stay unsupported.
///
/// **BUG THIS CATCHES**: Would catch an override that silently succeeds for a
/// command with no backing implementation.
#[tokio::test]
async fn given_unimplemented_command_when_handled_then_unsupported() {
    let handler = StandaloneHandler::new().unwrap();

    let result = handler.save_project(&context(), 7).await;

    assert!(matches!(result, Err(HandlerError::Unsupported { .. })));
}
