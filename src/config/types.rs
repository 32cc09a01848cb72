//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{default_encoding, default_port};
use super::sync::SyncConfig;
use super::timing::{KeepaliveConfig, RetryConfig, SchedulerConfig};
use super::transport::{ProxyConfig, TimeoutsConfig, TlsConfig};
use super::validation::{ValidationError, validate};

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Client configuration.
///
/// Every section is optional in TOML; missing values take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server candidates and text encoding.
    pub server: ServerConfig,
    /// Transport security.
    pub tls: TlsConfig,
    /// Optional upstream proxy used during the initial handshake.
    pub proxy: Option<ProxyConfig>,
    /// Socket-level timeouts.
    pub timeouts: TimeoutsConfig,
    /// Outbound scheduler pacing.
    pub scheduler: SchedulerConfig,
    /// Keepalive probing.
    pub keepalive: KeepaliveConfig,
    /// Connect retry and reconnect policy.
    pub retry: RetryConfig,
    /// Channel state tracking.
    pub sync: SyncConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Run the startup checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(self).map_err(ConfigError::Invalid)
    }
}

/// Server endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Ordered candidate addresses, tried in turn.
    pub addresses: Vec<String>,
    /// Port shared by every candidate.
    pub port: u16,
    /// `encoding_rs` label for the wire text encoding.
    pub encoding: String,
    /// Send the encoding's byte-order mark and a blank line right after
    /// connecting.
    pub byte_order_mark: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            port: default_port(),
            encoding: default_encoding(),
            byte_order_mark: false,
        }
    }
}
