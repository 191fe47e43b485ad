// Unit tests for command dispatch: handler calls, replies and error translation

use crate::tests::support::{
    BareHandler, Behaviour, Call, Harness, RecordingHandler, envelope,
};
use crate::transport::TransportFrame;

use models::{DownloadRequest, ExperimentRef, InstanceQuery, OutboundTag, UploadRequest};

use std::sync::Arc;

use tempfile::TempDir;
use url::Url;

const EXPERIMENT: ExperimentRef = ExperimentRef {
    experiment_id: 3,
    project_id: 7,
};

/// **VALUE**: Every parameterised command reaches its handler method with the
/// parameters typed correctly.
///
/// **WHY THIS MATTERS**: The dispatch table is long; a swapped arm or a
/// misread key sends a command to the wrong place.
///
/// **BUG THIS CATCHES**: Would catch reading `projectId` into the experiment
/// slot, or routing GET_SIMULATION_TREE to the model tree handler.
#[tokio::test]
async fn given_each_command_when_dispatched_then_matching_handler_receives_typed_parameters() {
    let ids = r#"{"experimentId":3,"projectId":"7"}"#;
    let query = r#"{"experimentId":3,"projectId":7,"instancePath":"net.cell"}"#;
    let download = r#"{"experimentId":3,"projectId":7,"instancePath":"net","format":"NEUROML"}"#;
    let upload = r#"{"experimentId":3,"projectId":7,"aspectPath":"net","format":"HDF5"}"#;
    let instance = InstanceQuery {
        experiment: EXPERIMENT,
        instance_path: "net.cell".to_string(),
    };
    let download_request = DownloadRequest {
        experiment: EXPERIMENT,
        instance_path: "net".to_string(),
        format: "NEUROML".to_string(),
    };
    let upload_request = UploadRequest {
        experiment: EXPERIMENT,
        aspect_path: "net".to_string(),
        format: "HDF5".to_string(),
    };

    let cases: Vec<(&str, String, Call)> = vec![
        ("geppetto_version", String::new(), Call::GeppettoVersion),
        (
            "LOAD_PROJECT_FROM_URL",
            "http://example.org/p.json".to_string(),
            Call::LoadProjectFromUrl("http://example.org/p.json".to_string()),
        ),
        (
            "LOAD_PROJECT_FROM_ID",
            r#"{"projectId":7,"experimentId":3}"#.to_string(),
            Call::LoadProjectFromId(7, Some(3)),
        ),
        (
            "LOAD_PROJECT_FROM_CONTENT",
            "{\"name\":\"p\"}".to_string(),
            Call::LoadProjectFromContent("{\"name\":\"p\"}".to_string()),
        ),
        (
            "SAVE_PROJECT",
            r#"{"projectId":7}"#.to_string(),
            Call::SaveProject(7),
        ),
        (
            "LOAD_EXPERIMENT",
            ids.to_string(),
            Call::LoadExperiment(EXPERIMENT),
        ),
        (
            "RUN_SCRIPT",
            "http://example.org/script.py".to_string(),
            Call::RunScript(Url::parse("http://example.org/script.py").unwrap()),
        ),
        (
            "PLAY_EXPERIMENT",
            ids.to_string(),
            Call::PlayExperiment(EXPERIMENT),
        ),
        (
            "DELETE_EXPERIMENT",
            ids.to_string(),
            Call::DeleteExperiment(EXPERIMENT),
        ),
        (
            "RUN_EXPERIMENT",
            ids.to_string(),
            Call::RunExperiment(EXPERIMENT),
        ),
        (
            "SET_WATCHED_VARIABLES",
            r#"{"experimentId":3,"projectId":7,"variables":["a.v","b.v"]}"#.to_string(),
            Call::SetWatchedVariables(EXPERIMENT, r#"["a.v","b.v"]"#.to_string()),
        ),
        (
            "CLEAR_WATCHED_VARIABLES",
            ids.to_string(),
            Call::ClearWatchedVariables(EXPERIMENT),
        ),
        ("IDLE_USER", String::new(), Call::IdleUser),
        (
            "GET_MODEL_TREE",
            query.to_string(),
            Call::GetModelTree(instance.clone()),
        ),
        (
            "GET_SIMULATION_TREE",
            query.to_string(),
            Call::GetSimulationTree(instance.clone()),
        ),
        (
            "GET_SUPPORTED_OUTPUTS",
            query.to_string(),
            Call::GetSupportedOutputs(instance.clone()),
        ),
        (
            "DOWNLOAD_MODEL",
            download.to_string(),
            Call::DownloadModel(download_request.clone()),
        ),
        (
            "DOWNLOAD_RESULTS",
            r#"{"experimentId":3,"projectId":7,"aspectPath":"net","format":"NEUROML"}"#
                .to_string(),
            Call::DownloadResults(download_request.clone()),
        ),
        (
            "SET_PARAMETERS",
            r#"{"modelAspectPath":"net","experimentId":3,"projectId":7,"modelParameters":{"g":1}}"#
                .to_string(),
            Call::SetParameters("net".to_string(), EXPERIMENT, r#"{"g":1}"#.to_string()),
        ),
        (
            "LINK_DROPBOX",
            r#"{"key":"secret"}"#.to_string(),
            Call::LinkDropbox("secret".to_string()),
        ),
        (
            "UNLINK_DROPBOX",
            r#"{"key":"secret"}"#.to_string(),
            Call::UnlinkDropbox("secret".to_string()),
        ),
        (
            "UPLOAD_MODEL",
            upload.to_string(),
            Call::UploadModel(upload_request.clone()),
        ),
        (
            "UPLOAD_RESULTS",
            upload.to_string(),
            Call::UploadResults(upload_request.clone()),
        ),
        (
            "EXPERIMENT_STATUS",
            "raw status".to_string(),
            Call::ExperimentStatus("raw status".to_string()),
        ),
    ];

    for (tag, data, expected) in cases {
        // GIVEN: A connection with a handler that replies to everything
        let handler = RecordingHandler::replying(OutboundTag::InfoMessage, "ok");
        let mut harness = Harness::open(handler.clone()).await;

        // WHEN: The command arrives
        harness
            .connection
            .on_text(&envelope("req", tag, &data))
            .await
            .unwrap();

        // THEN: Exactly one call with the expected parameters, and its reply
        assert_eq!(handler.calls(), vec![expected], "dispatch of {tag}");
        let reply = harness.next_envelope().await;
        assert_eq!(reply.request_id.as_deref(), Some("req"), "reply to {tag}");
        assert_eq!(reply.message_type, OutboundTag::InfoMessage);
        assert_eq!(reply.message, "ok");
    }
}

/// **VALUE**: Unknown tags are ignored without error or output.
#[tokio::test]
async fn given_unknown_tag_when_received_then_no_error_no_output_no_call() {
    // GIVEN: A recording handler
    let handler = RecordingHandler::replying(OutboundTag::InfoMessage, "ok");
    let mut harness = Harness::open(handler.clone()).await;

    // WHEN: A command with an unknown tag arrives
    let result = harness
        .connection
        .on_text(&envelope("1", "TELEPORT", "{}"))
        .await;

    // THEN: Ok, nothing sent, nothing called
    assert!(result.is_ok());
    assert!(handler.calls().is_empty());
    harness.assert_no_output().await;
}

/// **VALUE**: A malformed script URL becomes ERROR_READING_SCRIPT.
///
/// **BUG THIS CATCHES**: Would catch a URL parse failure that escapes as a
/// generic error, or one that still calls the handler.
#[tokio::test]
async fn given_malformed_script_url_when_dispatched_then_error_reading_script_and_no_call() {
    // GIVEN: A recording handler
    let handler = RecordingHandler::replying(OutboundTag::ScriptFetched, "ok");
    let mut harness = Harness::open(handler.clone()).await;

    // WHEN: RUN_SCRIPT arrives with something that is not a URL
    harness
        .connection
        .on_text(&envelope("7", "RUN_SCRIPT", "not a url"))
        .await
        .unwrap();

    // THEN: Exactly one ERROR_READING_SCRIPT, handler untouched
    let reply = harness.next_envelope().await;
    assert_eq!(reply.message_type, OutboundTag::ErrorReadingScript);
    assert_eq!(reply.request_id.as_deref(), Some("7"));
    assert!(handler.calls().is_empty());
    harness.assert_no_output().await;
}

/// **VALUE**: Watched-variable failures map to their dedicated error tag.
///
/// **WHY THIS MATTERS**: The client shows a specific message for this tag; a
/// generic ERROR would leave the watch panel stuck.
#[tokio::test]
async fn given_watch_handler_failures_when_dispatched_then_error_setting_watched_variables() {
    let cases = [
        ("SET_WATCHED_VARIABLES", Behaviour::FailExecution("sim busy".to_string())),
        (
            "SET_WATCHED_VARIABLES",
            Behaviour::FailInitialization("no sim".to_string()),
        ),
        ("CLEAR_WATCHED_VARIABLES", Behaviour::FailExecution("sim busy".to_string())),
    ];

    for (tag, behaviour) in cases {
        // GIVEN: A handler that fails
        let handler = RecordingHandler::new(behaviour);
        let mut harness = Harness::open(handler.clone()).await;

        // WHEN: The watch command arrives
        harness
            .connection
            .on_text(&envelope(
                "w",
                tag,
                r#"{"experimentId":1,"projectId":2,"variables":"[]"}"#,
            ))
            .await
            .unwrap();

        // THEN: Exactly one ERROR_SETTING_WATCHED_VARIABLES with an empty message
        let reply = harness.next_envelope().await;
        assert_eq!(reply.message_type, OutboundTag::ErrorSettingWatchedVariables);
        assert_eq!(reply.message, "");
        assert_eq!(handler.calls().len(), 1);
        harness.assert_no_output().await;
    }
}

#[tokio::test]
async fn given_other_handler_failure_when_dispatched_then_error_with_reason() {
    // GIVEN: A handler that fails with a reason
    let handler = RecordingHandler::new(Behaviour::FailExecution("disk full".to_string()));
    let mut harness = Harness::open(handler).await;

    // WHEN: SAVE_PROJECT arrives
    harness
        .connection
        .on_text(&envelope("s", "SAVE_PROJECT", r#"{"projectId":1}"#))
        .await
        .unwrap();

    // THEN: ERROR carrying the bare reason
    let reply = harness.next_envelope().await;
    assert_eq!(reply.message_type, OutboundTag::Error);
    assert_eq!(reply.message, "disk full");
}

#[tokio::test]
async fn given_handler_without_override_when_dispatched_then_no_feature() {
    // GIVEN: A handler that implements nothing
    let mut harness = Harness::open(Arc::new(BareHandler)).await;

    // WHEN: A supported-by-protocol command arrives
    harness
        .connection
        .on_text(&envelope("v", "GEPPETTO_VERSION", ""))
        .await
        .unwrap();

    // THEN: NO_FEATURE naming the command
    let reply = harness.next_envelope().await;
    assert_eq!(reply.message_type, OutboundTag::NoFeature);
    assert!(reply.message.contains("GEPPETTO_VERSION"));
}

/// **VALUE**: Bad parameters become a protocol ERROR instead of killing the
/// connection.
///
/// **BUG THIS CATCHES**: Would catch a parse failure propagated out of
/// `on_text`, which the read loop would treat as a dropped message with no
/// answer to the client.
#[tokio::test]
async fn given_invalid_parameters_when_dispatched_then_error_reply_and_no_call() {
    // GIVEN: A recording handler
    let handler = RecordingHandler::replying(OutboundTag::ExperimentRunning, "");
    let mut harness = Harness::open(handler.clone()).await;

    // WHEN: RUN_EXPERIMENT arrives with a non-numeric experiment ID
    harness
        .connection
        .on_text(&envelope(
            "r",
            "RUN_EXPERIMENT",
            r#"{"experimentId":"three","projectId":7}"#,
        ))
        .await
        .unwrap();

    // THEN: ERROR naming the parameter, handler untouched, connection open
    let reply = harness.next_envelope().await;
    assert_eq!(reply.message_type, OutboundTag::Error);
    assert!(reply.message.contains("experimentId"));
    assert!(handler.calls().is_empty());
    assert!(!harness.connection.is_closed());
}

#[tokio::test]
async fn given_reserved_command_when_dispatched_then_nothing_happens() {
    // GIVEN: A recording handler
    let handler = RecordingHandler::replying(OutboundTag::InfoMessage, "ok");
    let mut harness = Harness::open(handler.clone()).await;

    // WHEN: SIM and OBSERVE arrive
    for tag in ["SIM", "OBSERVE"] {
        harness
            .connection
            .on_text(&envelope("x", tag, ""))
            .await
            .unwrap();
    }

    // THEN: No call, no output
    assert!(handler.calls().is_empty());
    harness.assert_no_output().await;
}

/// **VALUE**: LOAD_EXPERIMENT runs only its own handler.
///
/// **BUG THIS CATCHES**: Would catch a dispatch that also runs the script
/// handler with the experiment payload.
#[tokio::test]
async fn given_load_experiment_when_dispatched_then_only_load_experiment_is_called() {
    // GIVEN: A recording handler
    let handler = RecordingHandler::replying(OutboundTag::ExperimentLoaded, "{}");
    let mut harness = Harness::open(handler.clone()).await;

    // WHEN: LOAD_EXPERIMENT arrives
    harness
        .connection
        .on_text(&envelope(
            "l",
            "LOAD_EXPERIMENT",
            r#"{"experimentId":3,"projectId":7}"#,
        ))
        .await
        .unwrap();

    // THEN: One call, one reply
    assert_eq!(handler.calls(), vec![Call::LoadExperiment(EXPERIMENT)]);
    assert_eq!(
        harness.next_envelope().await.message_type,
        OutboundTag::ExperimentLoaded
    );
    harness.assert_no_output().await;
}

/// **VALUE**: A project load drops replies queued for the previous project but
/// still delivers its own.
///
/// **WHY THIS MATTERS**: The reset must come before the handler runs,
/// otherwise the new PROJECT_LOADED would be discarded along with stale data.
#[tokio::test]
async fn given_queued_messages_when_project_loads_then_stale_dropped_and_new_reply_sent() {
    // GIVEN: A stale message queued but not yet written
    let handler = RecordingHandler::replying(OutboundTag::ProjectLoaded, "{}");
    let mut harness = Harness::open(handler).await;
    harness
        .connection
        .send(Some("old".to_string()), OutboundTag::ExperimentUpdate, "stale");

    // WHEN: LOAD_PROJECT_FROM_ID arrives
    harness
        .connection
        .on_text(&envelope("p", "LOAD_PROJECT_FROM_ID", r#"{"projectId":7}"#))
        .await
        .unwrap();

    // THEN: Only PROJECT_LOADED is written
    let reply = harness.next_envelope().await;
    assert_eq!(reply.message_type, OutboundTag::ProjectLoaded);
    assert_eq!(reply.request_id.as_deref(), Some("p"));
    harness.assert_no_output().await;
}

#[tokio::test]
async fn given_handler_returns_nothing_when_dispatched_then_no_output() {
    // GIVEN: A handler with no reply
    let handler = RecordingHandler::new(Behaviour::Nothing);
    let mut harness = Harness::open(handler.clone()).await;

    // WHEN: IDLE_USER arrives
    harness
        .connection
        .on_text(&envelope("i", "IDLE_USER", ""))
        .await
        .unwrap();

    // THEN: Called once, nothing written
    assert_eq!(handler.calls(), vec![Call::IdleUser]);
    harness.assert_no_output().await;
}

#[tokio::test]
async fn given_handler_returns_file_when_dispatched_then_binary_frame_is_sent() {
    // GIVEN: A handler that answers downloads with a file
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.xml");
    std::fs::write(&path, b"<model/>").unwrap();
    let handler = RecordingHandler::new(Behaviour::File(path));
    let mut harness = Harness::open(handler).await;

    // WHEN: DOWNLOAD_MODEL arrives
    harness
        .connection
        .on_text(&envelope(
            "d",
            "DOWNLOAD_MODEL",
            r#"{"experimentId":3,"projectId":7,"instancePath":"net","format":"XML"}"#,
        ))
        .await
        .unwrap();

    // THEN: A binary frame arrives
    assert!(matches!(
        harness.next_frame().await,
        TransportFrame::Binary(_)
    ));
}

#[tokio::test]
async fn given_behaviour_change_when_dispatching_twice_then_each_reply_follows_behaviour() {
    // GIVEN: A handler that first replies, then fails
    let handler = RecordingHandler::replying(OutboundTag::ExperimentRunning, "");
    let mut harness = Harness::open(handler.clone()).await;
    let data = r#"{"experimentId":3,"projectId":7}"#;

    // WHEN: Running twice with a failure in between
    harness
        .connection
        .on_text(&envelope("1", "RUN_EXPERIMENT", data))
        .await
        .unwrap();
    handler.set_behaviour(Behaviour::FailExecution("stopped".to_string()));
    harness
        .connection
        .on_text(&envelope("2", "RUN_EXPERIMENT", data))
        .await
        .unwrap();

    // THEN: Success reply, then ERROR, in order
    let first = harness.next_envelope().await;
    let second = harness.next_envelope().await;
    assert_eq!(first.message_type, OutboundTag::ExperimentRunning);
    assert_eq!(first.request_id.as_deref(), Some("1"));
    assert_eq!(second.message_type, OutboundTag::Error);
    assert_eq!(second.request_id.as_deref(), Some("2"));
}

/// **VALUE**: A file reply whose name cannot be framed is answered with ERROR.
///
/// **BUG THIS CATCHES**: Would catch the request going unanswered while the
/// connection stays open.
#[tokio::test]
async fn given_file_reply_with_over_long_name_when_dispatched_then_error_reply_and_open() {
    // GIVEN: A handler answering with a 256-byte file name
    let dir = TempDir::new().unwrap();
    let name = format!("{}.bin", "é".repeat(126));
    let handler = RecordingHandler::new(Behaviour::File(dir.path().join(name)));
    let mut harness = Harness::open(handler).await;

    // WHEN: DOWNLOAD_RESULTS arrives
    harness
        .connection
        .on_text(&envelope(
            "r",
            "DOWNLOAD_RESULTS",
            r#"{"experimentId":3,"projectId":7,"instancePath":"net","format":"HDF5"}"#,
        ))
        .await
        .unwrap();

    // THEN: ERROR for that request, connection still open
    let reply = harness.next_envelope().await;
    assert_eq!(reply.message_type, OutboundTag::Error);
    assert_eq!(reply.request_id.as_deref(), Some("r"));
    assert!(reply.message.contains("256"));
    assert!(!harness.connection.is_closed());
}
