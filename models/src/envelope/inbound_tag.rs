use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};

/// Command tags accepted on the inbound text channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundTag {
    GeppettoVersion,
    LoadProjectFromUrl,
    LoadProjectFromId,
    LoadProjectFromContent,
    SaveProject,
    LoadExperiment,
    RunScript,
    Sim,
    PlayExperiment,
    DeleteExperiment,
    RunExperiment,
    Observe,
    SetWatchedVariables,
    ClearWatchedVariables,
    IdleUser,
    GetModelTree,
    GetSimulationTree,
    GetSupportedOutputs,
    DownloadModel,
    SetParameters,
    LinkDropbox,
    UnlinkDropbox,
    UploadModel,
    UploadResults,
    DownloadResults,
    ExperimentStatus,
}

impl InboundTag {
    pub const ALL: [InboundTag; 26] = [
        InboundTag::GeppettoVersion,
        InboundTag::LoadProjectFromUrl,
        InboundTag::LoadProjectFromId,
        InboundTag::LoadProjectFromContent,
        InboundTag::SaveProject,
        InboundTag::LoadExperiment,
        InboundTag::RunScript,
        InboundTag::Sim,
        InboundTag::PlayExperiment,
        InboundTag::DeleteExperiment,
        InboundTag::RunExperiment,
        InboundTag::Observe,
        InboundTag::SetWatchedVariables,
        InboundTag::ClearWatchedVariables,
        InboundTag::IdleUser,
        InboundTag::GetModelTree,
        InboundTag::GetSimulationTree,
        InboundTag::GetSupportedOutputs,
        InboundTag::DownloadModel,
        InboundTag::SetParameters,
        InboundTag::LinkDropbox,
        InboundTag::UnlinkDropbox,
        InboundTag::UploadModel,
        InboundTag::UploadResults,
        InboundTag::DownloadResults,
        InboundTag::ExperimentStatus,
    ];

    /// Case-insensitive lookup. Unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(tag))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InboundTag::GeppettoVersion => "GEPPETTO_VERSION",
            InboundTag::LoadProjectFromUrl => "LOAD_PROJECT_FROM_URL",
            InboundTag::LoadProjectFromId => "LOAD_PROJECT_FROM_ID",
            InboundTag::LoadProjectFromContent => "LOAD_PROJECT_FROM_CONTENT",
            InboundTag::SaveProject => "SAVE_PROJECT",
            InboundTag::LoadExperiment => "LOAD_EXPERIMENT",
            InboundTag::RunScript => "RUN_SCRIPT",
            InboundTag::Sim => "SIM",
            InboundTag::PlayExperiment => "PLAY_EXPERIMENT",
            InboundTag::DeleteExperiment => "DELETE_EXPERIMENT",
            InboundTag::RunExperiment => "RUN_EXPERIMENT",
            InboundTag::Observe => "OBSERVE",
            InboundTag::SetWatchedVariables => "SET_WATCHED_VARIABLES",
            InboundTag::ClearWatchedVariables => "CLEAR_WATCHED_VARIABLES",
            InboundTag::IdleUser => "IDLE_USER",
            InboundTag::GetModelTree => "GET_MODEL_TREE",
            InboundTag::GetSimulationTree => "GET_SIMULATION_TREE",
            InboundTag::GetSupportedOutputs => "GET_SUPPORTED_OUTPUTS",
            InboundTag::DownloadModel => "DOWNLOAD_MODEL",
            InboundTag::SetParameters => "SET_PARAMETERS",
            InboundTag::LinkDropbox => "LINK_DROPBOX",
            InboundTag::UnlinkDropbox => "UNLINK_DROPBOX",
            InboundTag::UploadModel => "UPLOAD_MODEL",
            InboundTag::UploadResults => "UPLOAD_RESULTS",
            InboundTag::DownloadResults => "DOWNLOAD_RESULTS",
            InboundTag::ExperimentStatus => "EXPERIMENT_STATUS",
        }
    }
}

impl Display for InboundTag {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}
