//! Remote chat backend: channel activation and chat turns.
//!
//! [`ChatBackend`] is the seam between the session client and the transport, so the
//! client can be driven by the HTTP implementation or by a scripted one in tests.

mod http;
mod protocol;

use async_trait::async_trait;

pub use http::HttpBackend;
pub use protocol::{ChannelActivated, ChannelRequest, ChatReply, ChatRequest, ErrorBody};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request could not complete (connect, timeout, broken body).
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    /// Non-2xx status. `message` is the server's `detail` or a generic status message.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// 2xx response whose body is not what the endpoint promises.
    #[error("malformed response: {0}")]
    Protocol(String),
}

impl BackendError {
    /// Build an API error from a status code and the server-supplied detail, if any.
    pub fn api(status: u16, detail: Option<String>) -> Self {
        let message = detail
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status));
        BackendError::Api { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::Request(e) => e.status().map(|s| s.as_u16()),
            BackendError::Protocol(_) => None,
        }
    }
}

/// Backend that ingests channels and answers chat turns scoped by session id.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST /api/channel` — returns the new session id.
    async fn activate_channel(&self, channel_name: &str) -> Result<ChannelActivated, BackendError>;

    /// `POST /api/chat/{session_id}` — returns the reply (possibly empty).
    async fn send_message(&self, session_id: &str, message: &str) -> Result<ChatReply, BackendError>;
}
