//! Shared fixtures for the unit tests: a handler that records its calls and
//! helpers for reading frames off a [`ChannelTransport`].

use crate::connection::{Connection, ConnectionOptions, ConnectionRegistry};
use crate::error::HandlerError;
use crate::handler::{CommandContext, CommandHandler, HandlerReply, HandlerResult};
use crate::transport::{ChannelTransport, TransportFrame};

use common::{ErrorLocation, RedactedKey};

use models::{
    DownloadRequest, ExperimentRef, InstanceQuery, OutboundEnvelope, OutboundTag, UploadRequest,
};

use std::panic::Location;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use url::Url;

pub const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// One recorded handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GeppettoVersion,
    LoadProjectFromUrl(String),
    LoadProjectFromId(i64, Option<i64>),
    LoadProjectFromContent(String),
    SaveProject(i64),
    LoadExperiment(ExperimentRef),
    RunScript(Url),
    PlayExperiment(ExperimentRef),
    DeleteExperiment(ExperimentRef),
    RunExperiment(ExperimentRef),
    SetWatchedVariables(ExperimentRef, String),
    ClearWatchedVariables(ExperimentRef),
    IdleUser,
    GetModelTree(InstanceQuery),
    GetSimulationTree(InstanceQuery),
    GetSupportedOutputs(InstanceQuery),
    DownloadModel(DownloadRequest),
    DownloadResults(DownloadRequest),
    SetParameters(String, ExperimentRef, String),
    LinkDropbox(String),
    UnlinkDropbox(String),
    UploadModel(UploadRequest),
    UploadResults(UploadRequest),
    ExperimentStatus(String),
}

/// How the recording handler answers.
#[derive(Debug, Clone)]
pub enum Behaviour {
    Reply(OutboundTag, String),
    Nothing,
    File(PathBuf),
    FailExecution(String),
    FailInitialization(String),
}

pub struct RecordingHandler {
    calls: Mutex<Vec<Call>>,
    behaviour: Mutex<Behaviour>,
}

impl RecordingHandler {
    pub fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            behaviour: Mutex::new(behaviour),
        })
    }

    pub fn replying(tag: OutboundTag, message: &str) -> Arc<Self> {
        Self::new(Behaviour::Reply(tag, message.to_string()))
    }

    pub fn set_behaviour(&self, behaviour: Behaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> HandlerResult {
        self.calls.lock().unwrap().push(call);
        match self.behaviour.lock().unwrap().clone() {
            Behaviour::Reply(tag, message) => Ok(HandlerReply::message(tag, message)),
            Behaviour::Nothing => Ok(HandlerReply::None),
            Behaviour::File(path) => Ok(HandlerReply::File(path)),
            Behaviour::FailExecution(message) => Err(HandlerError::Execution {
                message,
                location: ErrorLocation::from(Location::caller()),
            }),
            Behaviour::FailInitialization(message) => Err(HandlerError::Initialization {
                message,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    async fn geppetto_version(&self, _ctx: &CommandContext) -> HandlerResult {
        self.record(Call::GeppettoVersion)
    }

    async fn load_project_from_url(&self, _ctx: &CommandContext, url: String) -> HandlerResult {
        self.record(Call::LoadProjectFromUrl(url))
    }

    async fn load_project_from_id(
        &self,
        _ctx: &CommandContext,
        project_id: i64,
        experiment_id: Option<i64>,
    ) -> HandlerResult {
        self.record(Call::LoadProjectFromId(project_id, experiment_id))
    }

    async fn load_project_from_content(
        &self,
        _ctx: &CommandContext,
        content: String,
    ) -> HandlerResult {
        self.record(Call::LoadProjectFromContent(content))
    }

    async fn save_project(&self, _ctx: &CommandContext, project_id: i64) -> HandlerResult {
        self.record(Call::SaveProject(project_id))
    }

    async fn load_experiment(
        &self,
        _ctx: &CommandContext,
        experiment: ExperimentRef,
    ) -> HandlerResult {
        self.record(Call::LoadExperiment(experiment))
    }

    async fn run_script(&self, _ctx: &CommandContext, url: Url) -> HandlerResult {
        self.record(Call::RunScript(url))
    }

    async fn play_experiment(
        &self,
        _ctx: &CommandContext,
        experiment: ExperimentRef,
    ) -> HandlerResult {
        self.record(Call::PlayExperiment(experiment))
    }

    async fn delete_experiment(
        &self,
        _ctx: &CommandContext,
        experiment: ExperimentRef,
    ) -> HandlerResult {
        self.record(Call::DeleteExperiment(experiment))
    }

    async fn run_experiment(
        &self,
        _ctx: &CommandContext,
        experiment: ExperimentRef,
    ) -> HandlerResult {
        self.record(Call::RunExperiment(experiment))
    }

    async fn set_watched_variables(
        &self,
        _ctx: &CommandContext,
        experiment: ExperimentRef,
        variables: String,
    ) -> HandlerResult {
        self.record(Call::SetWatchedVariables(experiment, variables))
    }

    async fn clear_watched_variables(
        &self,
        _ctx: &CommandContext,
        experiment: ExperimentRef,
    ) -> HandlerResult {
        self.record(Call::ClearWatchedVariables(experiment))
    }

    async fn idle_user(&self, _ctx: &CommandContext) -> HandlerResult {
        self.record(Call::IdleUser)
    }

    async fn get_model_tree(&self, _ctx: &CommandContext, query: InstanceQuery) -> HandlerResult {
        self.record(Call::GetModelTree(query))
    }

    async fn get_simulation_tree(
        &self,
        _ctx: &CommandContext,
        query: InstanceQuery,
    ) -> HandlerResult {
        self.record(Call::GetSimulationTree(query))
    }

    async fn get_supported_outputs(
        &self,
        _ctx: &CommandContext,
        query: InstanceQuery,
    ) -> HandlerResult {
        self.record(Call::GetSupportedOutputs(query))
    }

    async fn download_model(
        &self,
        _ctx: &CommandContext,
        request: DownloadRequest,
    ) -> HandlerResult {
        self.record(Call::DownloadModel(request))
    }

    async fn download_results(
        &self,
        _ctx: &CommandContext,
        request: DownloadRequest,
    ) -> HandlerResult {
        self.record(Call::DownloadResults(request))
    }

    async fn set_parameters(
        &self,
        _ctx: &CommandContext,
        model_aspect_path: String,
        experiment: ExperimentRef,
        model_parameters: String,
    ) -> HandlerResult {
        self.record(Call::SetParameters(
            model_aspect_path,
            experiment,
            model_parameters,
        ))
    }

    async fn link_dropbox(&self, _ctx: &CommandContext, key: RedactedKey) -> HandlerResult {
        self.record(Call::LinkDropbox(key.expose().to_string()))
    }

    async fn unlink_dropbox(&self, _ctx: &CommandContext, key: RedactedKey) -> HandlerResult {
        self.record(Call::UnlinkDropbox(key.expose().to_string()))
    }

    async fn upload_model(&self, _ctx: &CommandContext, request: UploadRequest) -> HandlerResult {
        self.record(Call::UploadModel(request))
    }

    async fn upload_results(
        &self,
        _ctx: &CommandContext,
        request: UploadRequest,
    ) -> HandlerResult {
        self.record(Call::UploadResults(request))
    }

    async fn experiment_status(&self, _ctx: &CommandContext, data: String) -> HandlerResult {
        self.record(Call::ExperimentStatus(data))
    }
}

/// A handler that overrides nothing.
pub struct BareHandler;

impl CommandHandler for BareHandler {}

/// An open connection over a [`ChannelTransport`], with the `CLIENT_ID`
/// greeting already consumed.
pub struct Harness {
    pub connection: Arc<Connection>,
    pub transport: ChannelTransport,
    pub frames: UnboundedReceiver<TransportFrame>,
    pub registry: ConnectionRegistry,
}

impl Harness {
    pub async fn open(handler: Arc<dyn CommandHandler>) -> Self {
        Self::open_with(handler, ConnectionOptions::default()).await
    }

    pub async fn open_with(handler: Arc<dyn CommandHandler>, options: ConnectionOptions) -> Self {
        let registry = ConnectionRegistry::new();
        let (transport, mut frames) = ChannelTransport::new();
        let connection = Connection::open(
            Arc::new(transport.clone()),
            handler,
            &registry,
            options,
        )
        .await
        .expect("connection should open");

        let greeting = next_envelope(&mut frames).await;
        assert_eq!(greeting.message_type, OutboundTag::ClientId);

        Self {
            connection,
            transport,
            frames,
            registry,
        }
    }

    pub async fn next_frame(&mut self) -> TransportFrame {
        next_frame(&mut self.frames).await
    }

    pub async fn next_envelope(&mut self) -> OutboundEnvelope {
        next_envelope(&mut self.frames).await
    }

    /// Flush the sender and assert nothing else was written.
    pub async fn assert_no_output(&mut self) {
        assert!(self.connection.sender().flush().await);
        assert!(
            self.frames.try_recv().is_err(),
            "expected no outbound frames"
        );
    }
}

pub async fn next_frame(frames: &mut UnboundedReceiver<TransportFrame>) -> TransportFrame {
    timeout(FRAME_TIMEOUT, frames.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("transport channel closed")
}

pub async fn next_envelope(frames: &mut UnboundedReceiver<TransportFrame>) -> OutboundEnvelope {
    match next_frame(frames).await {
        TransportFrame::Text(text) => OutboundEnvelope::parse(&text).expect("valid envelope"),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

pub fn envelope(request_id: &str, message_type: &str, data: &str) -> String {
    serde_json::json!({
        "requestID": request_id,
        "type": message_type,
        "data": data,
    })
    .to_string()
}
