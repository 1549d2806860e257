//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::{
    default_backoff_factor, default_connect_timeout_ms, default_initial_delay_ms, default_jitter,
    default_max_attempts, default_max_delay_ms, default_restart_after_ms, default_socket_path,
    default_token_env, default_true,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Realtime client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Push endpoint.
    #[serde(default)]
    pub endpoint: EndpointConfig,
    /// Where the session token comes from.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Automatic reconnection.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Handshake timeouts.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    /// Prometheus endpoint.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Conversations to follow from startup.
    #[serde(default)]
    pub subscriptions: SubscriptionsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Push endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the push server (e.g., "https://api.clientcontact.io").
    /// When unset, resolved from the environment, see [`super::resolve_endpoint`].
    pub url: Option<String>,
    /// Socket.IO mount path on the server.
    #[serde(default = "default_socket_path")]
    pub path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: default_socket_path(),
        }
    }
}

/// Token source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the session token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// File holding the session token. Takes precedence over `token_env`
    /// and is re-read on every connect so rotated tokens are picked up.
    pub token_file: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            token_file: None,
        }
    }
}

/// Reconnection configuration.
///
/// Delays grow as `initial_delay_ms * factor^attempt`, randomized by
/// `jitter` and capped at `max_delay_ms`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    /// Reconnect automatically after failures and drops (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Consecutive failed attempts before giving up (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First retry delay in milliseconds (default: 1000).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Delay cap in milliseconds (default: 5000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Growth factor between attempts (default: 2.0).
    #[serde(default = "default_backoff_factor")]
    pub factor: f64,
    /// Randomization factor in `[0, 1]` (default: 0.5).
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// How long `contactio-rt` waits before starting over once the client
    /// has given up, in milliseconds (default: 30000, 0 = never).
    #[serde(default = "default_restart_after_ms")]
    pub restart_after_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            factor: default_backoff_factor(),
            jitter: default_jitter(),
            restart_after_ms: default_restart_after_ms(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    /// Upper bound for one connection handshake in milliseconds (default: 20000).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout_ms(),
        }
    }
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Port for the `/metrics` HTTP endpoint. Disabled when unset.
    pub port: Option<u16>,
}

/// Startup subscriptions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionsConfig {
    /// Conversation ids to subscribe to before the first connect.
    #[serde(default)]
    pub conversations: Vec<String>,
}
