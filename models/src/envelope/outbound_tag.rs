use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};

/// Tags of server → client text messages.
///
/// `CLIENT_ID` and the `ERROR*` / `NO_FEATURE` tags are produced by the
/// protocol layer itself; the rest are result tags returned by command
/// handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundTag {
    ClientId,
    Error,
    ErrorLoadingProject,
    ErrorReadingScript,
    ErrorSettingWatchedVariables,
    ErrorDownloadingModel,
    ErrorDownloadingResults,
    NoFeature,
    InfoMessage,
    GeppettoVersion,
    ProjectLoaded,
    ProjectPersisted,
    ModelLoaded,
    ExperimentLoaded,
    ExperimentCreated,
    ExperimentDeleted,
    ExperimentRunning,
    ExperimentStatus,
    ExperimentUpdate,
    PlayExperiment,
    ScriptFetched,
    WatchedVariablesSet,
    ClearWatch,
    GetModelTree,
    GetSimulationTree,
    GetSupportedOutputs,
    UpdateModelTree,
    DownloadModel,
    DownloadResults,
    DropboxLinked,
    DropboxUnlinked,
    ModelUploaded,
    ResultsUploaded,
}

impl OutboundTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundTag::ClientId => "CLIENT_ID",
            OutboundTag::Error => "ERROR",
            OutboundTag::ErrorLoadingProject => "ERROR_LOADING_PROJECT",
            OutboundTag::ErrorReadingScript => "ERROR_READING_SCRIPT",
            OutboundTag::ErrorSettingWatchedVariables => "ERROR_SETTING_WATCHED_VARIABLES",
            OutboundTag::ErrorDownloadingModel => "ERROR_DOWNLOADING_MODEL",
            OutboundTag::ErrorDownloadingResults => "ERROR_DOWNLOADING_RESULTS",
            OutboundTag::NoFeature => "NO_FEATURE",
            OutboundTag::InfoMessage => "INFO_MESSAGE",
            OutboundTag::GeppettoVersion => "GEPPETTO_VERSION",
            OutboundTag::ProjectLoaded => "PROJECT_LOADED",
            OutboundTag::ProjectPersisted => "PROJECT_PERSISTED",
            OutboundTag::ModelLoaded => "MODEL_LOADED",
            OutboundTag::ExperimentLoaded => "EXPERIMENT_LOADED",
            OutboundTag::ExperimentCreated => "EXPERIMENT_CREATED",
            OutboundTag::ExperimentDeleted => "EXPERIMENT_DELETED",
            OutboundTag::ExperimentRunning => "EXPERIMENT_RUNNING",
            OutboundTag::ExperimentStatus => "EXPERIMENT_STATUS",
            OutboundTag::ExperimentUpdate => "EXPERIMENT_UPDATE",
            OutboundTag::PlayExperiment => "PLAY_EXPERIMENT",
            OutboundTag::ScriptFetched => "SCRIPT_FETCHED",
            OutboundTag::WatchedVariablesSet => "WATCHED_VARIABLES_SET",
            OutboundTag::ClearWatch => "CLEAR_WATCH",
            OutboundTag::GetModelTree => "GET_MODEL_TREE",
            OutboundTag::GetSimulationTree => "GET_SIMULATION_TREE",
            OutboundTag::GetSupportedOutputs => "GET_SUPPORTED_OUTPUTS",
            OutboundTag::UpdateModelTree => "UPDATE_MODEL_TREE",
            OutboundTag::DownloadModel => "DOWNLOAD_MODEL",
            OutboundTag::DownloadResults => "DOWNLOAD_RESULTS",
            OutboundTag::DropboxLinked => "DROPBOX_LINKED",
            OutboundTag::DropboxUnlinked => "DROPBOX_UNLINKED",
            OutboundTag::ModelUploaded => "MODEL_UPLOADED",
            OutboundTag::ResultsUploaded => "RESULTS_UPLOADED",
        }
    }

    /// Tags that report a failure to the client.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            OutboundTag::Error
                | OutboundTag::ErrorLoadingProject
                | OutboundTag::ErrorReadingScript
                | OutboundTag::ErrorSettingWatchedVariables
                | OutboundTag::ErrorDownloadingModel
                | OutboundTag::ErrorDownloadingResults
                | OutboundTag::NoFeature
        )
    }
}

impl Display for OutboundTag {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}
