//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.chanchat/config.json`) and environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Remote backend (channel and chat endpoints).
    #[serde(default)]
    pub backend: BackendConfig,

    /// Channel activation rules.
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Incremental reveal of bot replies.
    #[serde(default)]
    pub reveal: RevealConfig,

    /// Local development backend (`chanchat serve`).
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the client sends channel and chat requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Base URL without trailing slash (default "http://localhost:3000"). Overridden by CHANCHAT_BACKEND_URL env.
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Per-request timeout in seconds. Unset means requests may wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Channel activation rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    /// When non-empty, only these channel names may be activated. Names are compared exactly.
    #[serde(default)]
    pub allowed: Vec<String>,
}

/// Character-by-character display of bot replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealConfig {
    /// Milliseconds between characters (default 10).
    #[serde(default = "default_reveal_interval_ms")]
    pub interval_ms: u64,

    /// When false, replies are shown in full at once.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Bind settings for the local development backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for HTTP (default 3000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_backend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_reveal_interval_ms() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_server_port() -> u16 {
    3000
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: None,
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_reveal_interval_ms(),
            enabled: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

impl RevealConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl ChannelsConfig {
    /// True if `name` may be activated (empty allow-list allows everything).
    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.is_empty() || self.allowed.iter().any(|a| a == name)
    }
}

/// Resolve the backend base URL: env CHANCHAT_BACKEND_URL overrides config. Trailing slashes are dropped.
pub fn resolve_backend_url(config: &Config) -> String {
    std::env::var("CHANCHAT_BACKEND_URL")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .unwrap_or_else(|| config.backend.base_url.trim().to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CHANCHAT_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".chanchat").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, CHANCHAT_CONFIG_PATH, or the default. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
