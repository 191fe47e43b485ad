//! Typed parameter groups and the `data` object reader.

use crate::InboundTag;
use crate::error::command_error::CommandError;

use common::ErrorLocation;

use std::panic::Location;

use serde_json::{Map, Value};

pub(crate) const PROJECT_ID: &str = "projectId";
pub(crate) const EXPERIMENT_ID: &str = "experimentId";
pub(crate) const INSTANCE_PATH: &str = "instancePath";
pub(crate) const ASPECT_PATH: &str = "aspectPath";
pub(crate) const MODEL_ASPECT_PATH: &str = "modelAspectPath";
pub(crate) const MODEL_PARAMETERS: &str = "modelParameters";
pub(crate) const VARIABLES: &str = "variables";
pub(crate) const FORMAT: &str = "format";
pub(crate) const KEY: &str = "key";

/// An experiment within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExperimentRef {
    pub experiment_id: i64,
    pub project_id: i64,
}

/// Tree/outputs lookup rooted at an instance path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceQuery {
    pub experiment: ExperimentRef,
    pub instance_path: String,
}

/// Model or results download in a given format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub experiment: ExperimentRef,
    pub instance_path: String,
    pub format: String,
}

/// Model or results upload to linked cloud storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub experiment: ExperimentRef,
    pub aspect_path: String,
    pub format: String,
}

/// The `data` field of a parameterised command, parsed as a JSON object.
pub(crate) struct Parameters {
    command: InboundTag,
    values: Map<String, Value>,
}

impl Parameters {
    #[track_caller]
    pub(crate) fn parse(command: InboundTag, data: Option<&str>) -> Result<Self, CommandError> {
        let Some(data) = data else {
            return Err(CommandError::MalformedParameters {
                command,
                message: format!("{command} requires a parameter object"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        match serde_json::from_str::<Value>(data) {
            Ok(Value::Object(values)) => Ok(Self { command, values }),
            Ok(other) => Err(CommandError::MalformedParameters {
                command,
                message: format!("{command} parameters must be an object, got {other}"),
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(e) => Err(CommandError::MalformedParameters {
                command,
                message: format!("{command} parameters are not valid JSON: {e}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Required numeric identifier (JSON integer or integer string).
    #[track_caller]
    pub(crate) fn id(&self, name: &'static str) -> Result<i64, CommandError> {
        match self.optional_id(name)? {
            Some(id) => Ok(id),
            None => Err(self.missing(name)),
        }
    }

    #[track_caller]
    pub(crate) fn optional_id(&self, name: &'static str) -> Result<Option<i64>, CommandError> {
        let parsed = match self.values.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Number(number)) => number.as_i64(),
            Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
            Some(_) => None,
        };

        match parsed {
            Some(id) => Ok(Some(id)),
            None => Err(CommandError::InvalidParameter {
                command: self.command,
                parameter: name,
                message: format!(
                    "{} parameter '{name}' is not an integer: {}",
                    self.command, self.values[name]
                ),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Required string parameter. Non-string JSON values are kept as JSON text.
    #[track_caller]
    pub(crate) fn text(&self, name: &'static str) -> Result<String, CommandError> {
        match self.optional_text(name) {
            Some(text) => Ok(text),
            None => Err(self.missing(name)),
        }
    }

    pub(crate) fn optional_text(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    #[track_caller]
    pub(crate) fn experiment(&self) -> Result<ExperimentRef, CommandError> {
        Ok(ExperimentRef {
            experiment_id: self.id(EXPERIMENT_ID)?,
            project_id: self.id(PROJECT_ID)?,
        })
    }

    #[track_caller]
    fn missing(&self, name: &'static str) -> CommandError {
        CommandError::MissingParameter {
            command: self.command,
            parameter: name,
            message: format!("{} requires parameter '{name}'", self.command),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
