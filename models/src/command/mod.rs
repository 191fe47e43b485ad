//! The typed command union decoded from an inbound envelope.

mod params;

pub use params::{DownloadRequest, ExperimentRef, InstanceQuery, UploadRequest};

use crate::InboundTag;
use crate::error::command_error::CommandError;

use params::{
    ASPECT_PATH, FORMAT, INSTANCE_PATH, KEY, MODEL_ASPECT_PATH, MODEL_PARAMETERS, PROJECT_ID,
    EXPERIMENT_ID, Parameters, VARIABLES,
};

use common::{ErrorLocation, RedactedKey};

use std::panic::Location;

use url::Url;

/// One inbound command with its parameters already extracted and typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GeppettoVersion,
    LoadProjectFromUrl {
        url: String,
    },
    LoadProjectFromId {
        project_id: i64,
        experiment_id: Option<i64>,
    },
    LoadProjectFromContent {
        content: String,
    },
    SaveProject {
        project_id: i64,
    },
    LoadExperiment(ExperimentRef),
    RunScript {
        url: Url,
    },
    Sim,
    PlayExperiment(ExperimentRef),
    DeleteExperiment(ExperimentRef),
    RunExperiment(ExperimentRef),
    Observe,
    SetWatchedVariables {
        experiment: ExperimentRef,
        variables: String,
    },
    ClearWatchedVariables(ExperimentRef),
    IdleUser,
    GetModelTree(InstanceQuery),
    GetSimulationTree(InstanceQuery),
    GetSupportedOutputs(InstanceQuery),
    DownloadModel(DownloadRequest),
    DownloadResults(DownloadRequest),
    SetParameters {
        model_aspect_path: String,
        experiment: ExperimentRef,
        model_parameters: String,
    },
    LinkDropbox {
        key: RedactedKey,
    },
    UnlinkDropbox {
        key: RedactedKey,
    },
    UploadModel(UploadRequest),
    UploadResults(UploadRequest),
    ExperimentStatus {
        data: String,
    },
}

impl Command {
    /// Extract the parameters `tag` requires from the envelope `data` field.
    ///
    /// # Errors
    ///
    /// - [`CommandError::MalformedUrl`] for a RUN_SCRIPT whose data is not an absolute URL
    /// - [`CommandError::MalformedParameters`] if a parameter object is missing or not a JSON object
    /// - [`CommandError::MissingParameter`] / [`CommandError::InvalidParameter`] for a
    ///   required parameter that is absent or has the wrong type
    #[track_caller]
    pub fn decode(tag: InboundTag, data: Option<&str>) -> Result<Self, CommandError> {
        let command = match tag {
            InboundTag::GeppettoVersion => Command::GeppettoVersion,
            InboundTag::LoadProjectFromUrl => Command::LoadProjectFromUrl {
                url: raw_data(tag, data)?,
            },
            InboundTag::LoadProjectFromId => {
                let params = Parameters::parse(tag, data)?;
                Command::LoadProjectFromId {
                    project_id: params.id(PROJECT_ID)?,
                    experiment_id: params.optional_id(EXPERIMENT_ID)?,
                }
            }
            InboundTag::LoadProjectFromContent => Command::LoadProjectFromContent {
                content: raw_data(tag, data)?,
            },
            InboundTag::SaveProject => Command::SaveProject {
                project_id: Parameters::parse(tag, data)?.id(PROJECT_ID)?,
            },
            InboundTag::LoadExperiment => {
                Command::LoadExperiment(Parameters::parse(tag, data)?.experiment()?)
            }
            InboundTag::RunScript => Command::RunScript {
                url: script_url(tag, data)?,
            },
            InboundTag::Sim => Command::Sim,
            InboundTag::PlayExperiment => {
                Command::PlayExperiment(Parameters::parse(tag, data)?.experiment()?)
            }
            InboundTag::DeleteExperiment => {
                Command::DeleteExperiment(Parameters::parse(tag, data)?.experiment()?)
            }
            InboundTag::RunExperiment => {
                Command::RunExperiment(Parameters::parse(tag, data)?.experiment()?)
            }
            InboundTag::Observe => Command::Observe,
            InboundTag::SetWatchedVariables => {
                let params = Parameters::parse(tag, data)?;
                Command::SetWatchedVariables {
                    experiment: params.experiment()?,
                    variables: params.text(VARIABLES)?,
                }
            }
            InboundTag::ClearWatchedVariables => {
                Command::ClearWatchedVariables(Parameters::parse(tag, data)?.experiment()?)
            }
            InboundTag::IdleUser => Command::IdleUser,
            InboundTag::GetModelTree => Command::GetModelTree(instance_query(tag, data)?),
            InboundTag::GetSimulationTree => {
                Command::GetSimulationTree(instance_query(tag, data)?)
            }
            InboundTag::GetSupportedOutputs => {
                Command::GetSupportedOutputs(instance_query(tag, data)?)
            }
            InboundTag::DownloadModel => Command::DownloadModel(download_request(tag, data)?),
            InboundTag::DownloadResults => {
                Command::DownloadResults(download_request(tag, data)?)
            }
            InboundTag::SetParameters => {
                let params = Parameters::parse(tag, data)?;
                Command::SetParameters {
                    model_aspect_path: params.text(MODEL_ASPECT_PATH)?,
                    experiment: params.experiment()?,
                    model_parameters: params.text(MODEL_PARAMETERS)?,
                }
            }
            InboundTag::LinkDropbox => Command::LinkDropbox {
                key: RedactedKey::new(Parameters::parse(tag, data)?.text(KEY)?),
            },
            InboundTag::UnlinkDropbox => Command::UnlinkDropbox {
                key: RedactedKey::new(Parameters::parse(tag, data)?.text(KEY)?),
            },
            InboundTag::UploadModel => Command::UploadModel(upload_request(tag, data)?),
            InboundTag::UploadResults => Command::UploadResults(upload_request(tag, data)?),
            InboundTag::ExperimentStatus => Command::ExperimentStatus {
                data: data.unwrap_or_default().to_string(),
            },
        };

        Ok(command)
    }

    pub fn tag(&self) -> InboundTag {
        match self {
            Command::GeppettoVersion => InboundTag::GeppettoVersion,
            Command::LoadProjectFromUrl { .. } => InboundTag::LoadProjectFromUrl,
            Command::LoadProjectFromId { .. } => InboundTag::LoadProjectFromId,
            Command::LoadProjectFromContent { .. } => InboundTag::LoadProjectFromContent,
            Command::SaveProject { .. } => InboundTag::SaveProject,
            Command::LoadExperiment(_) => InboundTag::LoadExperiment,
            Command::RunScript { .. } => InboundTag::RunScript,
            Command::Sim => InboundTag::Sim,
            Command::PlayExperiment(_) => InboundTag::PlayExperiment,
            Command::DeleteExperiment(_) => InboundTag::DeleteExperiment,
            Command::RunExperiment(_) => InboundTag::RunExperiment,
            Command::Observe => InboundTag::Observe,
            Command::SetWatchedVariables { .. } => InboundTag::SetWatchedVariables,
            Command::ClearWatchedVariables(_) => InboundTag::ClearWatchedVariables,
            Command::IdleUser => InboundTag::IdleUser,
            Command::GetModelTree(_) => InboundTag::GetModelTree,
            Command::GetSimulationTree(_) => InboundTag::GetSimulationTree,
            Command::GetSupportedOutputs(_) => InboundTag::GetSupportedOutputs,
            Command::DownloadModel(_) => InboundTag::DownloadModel,
            Command::DownloadResults(_) => InboundTag::DownloadResults,
            Command::SetParameters { .. } => InboundTag::SetParameters,
            Command::LinkDropbox { .. } => InboundTag::LinkDropbox,
            Command::UnlinkDropbox { .. } => InboundTag::UnlinkDropbox,
            Command::UploadModel(_) => InboundTag::UploadModel,
            Command::UploadResults(_) => InboundTag::UploadResults,
            Command::ExperimentStatus { .. } => InboundTag::ExperimentStatus,
        }
    }

    /// Project loads start a new context: outbound messages still queued for
    /// the previous project must be dropped.
    pub fn resets_sender(&self) -> bool {
        matches!(
            self,
            Command::LoadProjectFromUrl { .. }
                | Command::LoadProjectFromId { .. }
                | Command::LoadProjectFromContent { .. }
        )
    }

    /// Reserved tags that are accepted but dispatch to nothing.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Command::Sim | Command::Observe)
    }
}

#[track_caller]
fn raw_data(tag: InboundTag, data: Option<&str>) -> Result<String, CommandError> {
    data.map(str::to_string)
        .ok_or_else(|| CommandError::MissingParameter {
            command: tag,
            parameter: "data",
            message: format!("{tag} requires a data payload"),
            location: ErrorLocation::from(Location::caller()),
        })
}

#[track_caller]
fn script_url(tag: InboundTag, data: Option<&str>) -> Result<Url, CommandError> {
    let raw = data.unwrap_or_default().trim();
    Url::parse(raw).map_err(|e| CommandError::MalformedUrl {
        command: tag,
        url: raw.to_string(),
        message: format!("Cannot read script from '{raw}': {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

#[track_caller]
fn instance_query(tag: InboundTag, data: Option<&str>) -> Result<InstanceQuery, CommandError> {
    let params = Parameters::parse(tag, data)?;
    Ok(InstanceQuery {
        experiment: params.experiment()?,
        instance_path: params.text(INSTANCE_PATH)?,
    })
}

#[track_caller]
fn download_request(tag: InboundTag, data: Option<&str>) -> Result<DownloadRequest, CommandError> {
    let params = Parameters::parse(tag, data)?;
    let instance_path = match params.optional_text(INSTANCE_PATH) {
        Some(path) => path,
        // Results downloads have historically been addressed by aspect path.
        None => params.text(if tag == InboundTag::DownloadResults {
            ASPECT_PATH
        } else {
            INSTANCE_PATH
        })?,
    };
    Ok(DownloadRequest {
        experiment: params.experiment()?,
        instance_path,
        format: params.text(FORMAT)?,
    })
}

#[track_caller]
fn upload_request(tag: InboundTag, data: Option<&str>) -> Result<UploadRequest, CommandError> {
    let params = Parameters::parse(tag, data)?;
    Ok(UploadRequest {
        experiment: params.experiment()?,
        aspect_path: params.text(ASPECT_PATH)?,
        format: params.text(FORMAT)?,
    })
}
