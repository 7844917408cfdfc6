//! Process-wide configuration for the token gateway.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::gateway::types::SessionMode;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_EVENT_CAPACITY: usize = 32;

/// CLI options for the gateway binary. Every option can also come from the environment.
#[derive(Debug, Parser, Clone)]
#[command(name = "liveavatar-gateway", about = "LiveAvatar session token gateway", version)]
pub struct GatewayArgs {
    /// Base URL of the upstream token API
    #[arg(long = "api-url", env = "LIVEAVATAR_API_URL")]
    pub api_url: Option<String>,

    /// API key sent to the upstream as X-API-KEY
    #[arg(long = "api-key", env = "LIVEAVATAR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Avatar used when the caller sends no override
    #[arg(long = "avatar-id", env = "LIVEAVATAR_AVATAR_ID")]
    pub avatar_id: Option<String>,

    /// Voice used when the caller sends no override
    #[arg(long = "voice-id", env = "LIVEAVATAR_VOICE_ID")]
    pub voice_id: Option<String>,

    /// Conversation context used when the caller sends no override
    #[arg(long = "context-id", env = "LIVEAVATAR_CONTEXT_ID")]
    pub context_id: Option<String>,

    /// Persona language
    #[arg(long, env = "LIVEAVATAR_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Address the HTTP server binds to
    #[arg(long, env = "LIVEAVATAR_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,

    /// Upstream request timeout (milliseconds)
    #[arg(
        long = "upstream-timeout-ms",
        env = "LIVEAVATAR_UPSTREAM_TIMEOUT_MS",
        default_value_t = DEFAULT_UPSTREAM_TIMEOUT_MS
    )]
    pub upstream_timeout_ms: u64,

    /// Directory for JSON log files (disabled when unset)
    #[arg(long = "log-dir", env = "LIVEAVATAR_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting --{flag} (or {env})")]
    Missing {
        flag: &'static str,
        env: &'static str,
    },
    #[error("invalid upstream url {0:?}: expected an http:// or https:// base url")]
    InvalidUrl(String),
    #[error("--upstream-timeout-ms must be greater than zero")]
    ZeroTimeout,
}

/// Immutable configuration record handed to the gateway at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_url: String,
    pub api_key: String,
    pub default_avatar_id: String,
    pub default_voice_id: String,
    pub default_context_id: String,
    pub default_language: String,
    pub listen_addr: SocketAddr,
    pub upstream_timeout: Duration,
    pub log_dir: Option<PathBuf>,
}

impl GatewayArgs {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_config() -> Result<GatewayConfig, ConfigError> {
        Self::parse().into_config()
    }

    pub fn into_config(self) -> Result<GatewayConfig, ConfigError> {
        let api_url = required(self.api_url, "api-url", "LIVEAVATAR_API_URL")?;
        let api_key = required(self.api_key, "api-key", "LIVEAVATAR_API_KEY")?;
        let default_avatar_id = required(self.avatar_id, "avatar-id", "LIVEAVATAR_AVATAR_ID")?;
        let default_voice_id = required(self.voice_id, "voice-id", "LIVEAVATAR_VOICE_ID")?;
        let default_context_id =
            required(self.context_id, "context-id", "LIVEAVATAR_CONTEXT_ID")?;
        let default_language =
            required(Some(self.language), "language", "LIVEAVATAR_LANGUAGE")?;

        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(api_url));
        }
        let api_url = api_url.trim_end_matches('/').to_string();

        if self.upstream_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(GatewayConfig {
            api_url,
            api_key,
            default_avatar_id,
            default_voice_id,
            default_context_id,
            default_language,
            listen_addr: self.listen,
            upstream_timeout: Duration::from_millis(self.upstream_timeout_ms),
            log_dir: self.log_dir,
        })
    }
}

fn required(
    value: Option<String>,
    flag: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing { flag, env }),
    }
}

/// Settings for one session coordinator instance.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub mode: SessionMode,
    /// Pre-filled value of the custom avatar field.
    pub initial_avatar_id: Option<String>,
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::Full,
            initial_avatar_id: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
