//! WebSocket message DTOs.
//!
//! Every frame carries one JSON envelope tagged by `type`:
//!
//! ```json
//! {"type":"add","target":"board1","word":{"word":"hi","xValue":10,"yValue":20,"deltaX":0,"deltaY":0,"id":"w1"}}
//! ```

use serde::{Deserialize, Serialize};

/// Envelope kind
///
/// A missing or unrecognized `type` decodes as [`MessageType::Unknown`] and is ignored
/// rather than treated as a malformed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Add,
    Move,
    Delete,
    Get,
    Join,
    Leave,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Word payload as sent on the wire. Missing fields take zero values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WordDto {
    pub word: String,
    pub x_value: i64,
    pub y_value: i64,
    pub delta_x: i64,
    pub delta_y: i64,
    pub id: String,
}

/// Envelope exchanged in both directions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub r#type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<WordDto>,
    /// Set by the server on join notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Addressed room name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Envelope {
    /// Notification sent to existing members when `client_id` joins `room`.
    pub fn join_notification(client_id: &str, room: &str) -> Self {
        Self {
            r#type: MessageType::Join,
            word: None,
            client_id: Some(client_id.to_string()),
            target: Some(room.to_string()),
        }
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decode a binary frame; invalid UTF-8 is reported as a JSON error.
    pub fn decode_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Response to a `get` request, sent to the requester only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordListMessage {
    pub r#type: MessageType,
    pub words: Vec<WordDto>,
}

impl WordListMessage {
    pub fn new(words: Vec<WordDto>) -> Self {
        Self {
            r#type: MessageType::Get,
            words,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
