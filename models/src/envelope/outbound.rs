use crate::envelope::OutboundTag;
use crate::error::model_error::ModelError;

use common::ErrorLocation;

use std::panic::Location;

use serde::{Deserialize, Serialize};

/// A server → client text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    #[serde(rename = "requestID")]
    pub request_id: Option<String>,

    #[serde(rename = "type")]
    pub message_type: OutboundTag,

    pub message: String,
}

impl OutboundEnvelope {
    pub fn new(
        request_id: Option<String>,
        message_type: OutboundTag,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            message_type,
            message: message.into(),
        }
    }

    /// Serialize to the JSON text frame.
    #[track_caller]
    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string(self).map_err(|e| ModelError::Serialization {
            message: format!("Failed to serialize outbound envelope: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Decode an outbound frame (client side and tests).
    #[track_caller]
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        serde_json::from_str(raw).map_err(|e| ModelError::MalformedEnvelope {
            message: format!("Invalid outbound envelope: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
