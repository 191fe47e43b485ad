use crate::envelope::InboundTag;
use crate::error::model_error::ModelError;

use common::ErrorLocation;

use std::panic::Location;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A decoded client → server message.
///
/// `message_type` is kept as the raw string so that unknown tags survive
/// decoding; resolve it with [`InboundEnvelope::tag`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "requestID", default)]
    pub request_id: Option<String>,

    #[serde(rename = "type")]
    pub message_type: String,

    #[serde(default, deserialize_with = "deserialize_data")]
    pub data: Option<String>,
}

impl InboundEnvelope {
    pub fn new(
        request_id: Option<String>,
        message_type: impl Into<String>,
        data: Option<String>,
    ) -> Self {
        Self {
            request_id,
            message_type: message_type.into(),
            data,
        }
    }

    /// Decode a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedEnvelope`] if `raw` is not a JSON object
    /// with a string `type` field.
    #[track_caller]
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        serde_json::from_str(raw).map_err(|e| ModelError::MalformedEnvelope {
            message: format!("Invalid inbound envelope: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// The command tag, matched case-insensitively. `None` for unknown tags.
    pub fn tag(&self) -> Option<InboundTag> {
        InboundTag::parse(&self.message_type)
    }
}

// `data` is normally a string (often serialized JSON), but clients that embed
// the object directly are accepted too; it is kept as its JSON text.
fn deserialize_data<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
