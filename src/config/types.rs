//! Core configuration types and loading.

use super::channels::ChannelsConfig;
use super::dispatch::DispatchConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Who we are on the network.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Channel actor settings and autojoin list.
    #[serde(default)]
    pub channels: ChannelsConfig,
    /// Module dispatch settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Validator chains defined over the built-in predicates.
    #[serde(default)]
    pub validators: Vec<ValidatorBlock>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Bot identity.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Nickname the connection layer registers with (default: "slircbot").
    #[serde(default = "default_nick")]
    pub nick: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            nick: default_nick(),
        }
    }
}

fn default_nick() -> String {
    "slircbot".to_string()
}

/// Log output configuration. `RUST_LOG` overrides `filter`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (default: "info").
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

/// A named validator chain.
///
/// ```toml
/// [[validators]]
/// name = "channel_message"
/// predicates = ["has_prefix", "channel_target"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorBlock {
    pub name: String,
    pub predicates: Vec<String>,
}
