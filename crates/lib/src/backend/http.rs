//! HTTP implementation of [`ChatBackend`] over reqwest.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::protocol::{ChannelActivated, ChannelRequest, ChatReply, ChatRequest, ErrorBody};
use super::{BackendError, ChatBackend};
use crate::config::{self, Config};

/// Client for the channel/chat HTTP API.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            base_url,
            client: builder.build()?,
        })
    }

    /// Base URL from config (or CHANCHAT_BACKEND_URL) and the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(
            config::resolve_backend_url(config),
            config.backend.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base_url` joined with `segments`, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, BackendError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| BackendError::Protocol(format!("invalid base url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Protocol(format!("base url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_json<B, T>(&self, url: reqwest::Url, body: &B) -> Result<T, BackendError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        log::debug!("POST {}", url);
        let res = self.client.post(url).json(body).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.detail);
            return Err(BackendError::api(status.as_u16(), detail));
        }
        serde_json::from_str(&text).map_err(|e| BackendError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn activate_channel(&self, channel_name: &str) -> Result<ChannelActivated, BackendError> {
        let url = self.endpoint(&["api", "channel"])?;
        let body = ChannelRequest {
            channel_name: channel_name.to_string(),
        };
        let activated: ChannelActivated = self.post_json(url, &body).await?;
        if activated.session_id.trim().is_empty() {
            return Err(BackendError::Protocol("empty session_id".to_string()));
        }
        Ok(activated)
    }

    async fn send_message(&self, session_id: &str, message: &str) -> Result<ChatReply, BackendError> {
        let url = self.endpoint(&["api", "chat", session_id])?;
        let body = ChatRequest {
            message: message.to_string(),
        };
        self.post_json(url, &body).await
    }
}
