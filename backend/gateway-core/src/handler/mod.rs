//! The business-logic surface a connection dispatches commands to.
//!
//! A [`CommandHandler`] is bound to a connection when it opens. Dispatch
//! decodes each inbound command, calls the matching method with typed
//! parameters and turns the returned [`HandlerReply`] (or [`HandlerError`])
//! into outbound traffic.
//!
//! Every method defaults to [`HandlerError::Unsupported`], which the client
//! sees as `NO_FEATURE`. Implementors override only what they support.

use crate::error::HandlerError;
use crate::messaging::MessageSender;

use common::{ErrorLocation, RedactedKey};

use models::{
    ConnectionId, DownloadRequest, ExperimentRef, InboundTag, InstanceQuery, OutboundTag,
    UploadRequest,
};

use std::panic::Location;
use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

pub type HandlerResult = Result<HandlerReply, HandlerError>;

/// Per-dispatch context handed to every handler method.
#[derive(Clone)]
pub struct CommandContext {
    pub request_id: Option<String>,
    pub connection_id: ConnectionId,
    /// Outbound queue of the connection, for progress updates sent while a
    /// command is still running.
    pub outbound: MessageSender,
}

/// What dispatch sends back once a handler method returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerReply {
    /// Nothing to send (the handler replied through `outbound`, or the
    /// command has no response).
    None,
    Message {
        tag: OutboundTag,
        message: String,
    },
    /// Stream the file to the client as a binary frame.
    File(PathBuf),
}

impl HandlerReply {
    pub fn message(tag: OutboundTag, message: impl Into<String>) -> Self {
        HandlerReply::Message {
            tag,
            message: message.into(),
        }
    }
}

#[track_caller]
fn unsupported(command: InboundTag) -> HandlerResult {
    Err(HandlerError::Unsupported {
        command,
        location: ErrorLocation::from(Location::caller()),
    })
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn geppetto_version(&self, _ctx: &CommandContext) -> HandlerResult {
        unsupported(InboundTag::GeppettoVersion)
    }

    async fn load_project_from_url(&self, _ctx: &CommandContext, _url: String) -> HandlerResult {
        unsupported(InboundTag::LoadProjectFromUrl)
    }

    async fn load_project_from_id(
        &self,
        _ctx: &CommandContext,
        _project_id: i64,
        _experiment_id: Option<i64>,
    ) -> HandlerResult {
        unsupported(InboundTag::LoadProjectFromId)
    }

    async fn load_project_from_content(
        &self,
        _ctx: &CommandContext,
        _content: String,
    ) -> HandlerResult {
        unsupported(InboundTag::LoadProjectFromContent)
    }

    async fn save_project(&self, _ctx: &CommandContext, _project_id: i64) -> HandlerResult {
        unsupported(InboundTag::SaveProject)
    }

    async fn load_experiment(
        &self,
        _ctx: &CommandContext,
        _experiment: ExperimentRef,
    ) -> HandlerResult {
        unsupported(InboundTag::LoadExperiment)
    }

    async fn run_script(&self, _ctx: &CommandContext, _url: Url) -> HandlerResult {
        unsupported(InboundTag::RunScript)
    }

    async fn play_experiment(
        &self,
        _ctx: &CommandContext,
        _experiment: ExperimentRef,
    ) -> HandlerResult {
        unsupported(InboundTag::PlayExperiment)
    }

    async fn delete_experiment(
        &self,
        _ctx: &CommandContext,
        _experiment: ExperimentRef,
    ) -> HandlerResult {
        unsupported(InboundTag::DeleteExperiment)
    }

    async fn run_experiment(
        &self,
        _ctx: &CommandContext,
        _experiment: ExperimentRef,
    ) -> HandlerResult {
        unsupported(InboundTag::RunExperiment)
    }

    async fn set_watched_variables(
        &self,
        _ctx: &CommandContext,
        _experiment: ExperimentRef,
        _variables: String,
    ) -> HandlerResult {
        unsupported(InboundTag::SetWatchedVariables)
    }

    async fn clear_watched_variables(
        &self,
        _ctx: &CommandContext,
        _experiment: ExperimentRef,
    ) -> HandlerResult {
        unsupported(InboundTag::ClearWatchedVariables)
    }

    async fn idle_user(&self, _ctx: &CommandContext) -> HandlerResult {
        unsupported(InboundTag::IdleUser)
    }

    async fn get_model_tree(&self, _ctx: &CommandContext, _query: InstanceQuery) -> HandlerResult {
        unsupported(InboundTag::GetModelTree)
    }

    async fn get_simulation_tree(
        &self,
        _ctx: &CommandContext,
        _query: InstanceQuery,
    ) -> HandlerResult {
        unsupported(InboundTag::GetSimulationTree)
    }

    async fn get_supported_outputs(
        &self,
        _ctx: &CommandContext,
        _query: InstanceQuery,
    ) -> HandlerResult {
        unsupported(InboundTag::GetSupportedOutputs)
    }

    async fn download_model(
        &self,
        _ctx: &CommandContext,
        _request: DownloadRequest,
    ) -> HandlerResult {
        unsupported(InboundTag::DownloadModel)
    }

    async fn download_results(
        &self,
        _ctx: &CommandContext,
        _request: DownloadRequest,
    ) -> HandlerResult {
        unsupported(InboundTag::DownloadResults)
    }

    async fn set_parameters(
        &self,
        _ctx: &CommandContext,
        _model_aspect_path: String,
        _experiment: ExperimentRef,
        _model_parameters: String,
    ) -> HandlerResult {
        unsupported(InboundTag::SetParameters)
    }

    async fn link_dropbox(&self, _ctx: &CommandContext, _key: RedactedKey) -> HandlerResult {
        unsupported(InboundTag::LinkDropbox)
    }

    async fn unlink_dropbox(&self, _ctx: &CommandContext, _key: RedactedKey) -> HandlerResult {
        unsupported(InboundTag::UnlinkDropbox)
    }

    async fn upload_model(&self, _ctx: &CommandContext, _request: UploadRequest) -> HandlerResult {
        unsupported(InboundTag::UploadModel)
    }

    async fn upload_results(
        &self,
        _ctx: &CommandContext,
        _request: UploadRequest,
    ) -> HandlerResult {
        unsupported(InboundTag::UploadResults)
    }

    async fn experiment_status(&self, _ctx: &CommandContext, _data: String) -> HandlerResult {
        unsupported(InboundTag::ExperimentStatus)
    }
}
