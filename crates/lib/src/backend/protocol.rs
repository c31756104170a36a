//! Wire types for the channel and chat endpoints (snake_case JSON).

use serde::{Deserialize, Serialize};

/// Body of `POST /api/channel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRequest {
    pub channel_name: String,
}

/// Successful `POST /api/channel` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelActivated {
    pub session_id: String,
}

/// Body of `POST /api/chat/{session_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Successful `POST /api/chat/{session_id}` response. `response` may be absent or empty;
/// the client reports that as "no response received".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ChatReply {
    /// Reply text, if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.response.as_deref().filter(|s| !s.is_empty())
    }
}

/// Error body on non-2xx responses: `{ "detail": "..." }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
