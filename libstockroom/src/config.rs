//! Configuration management for Stockroom

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub write: WriteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Names the remote collections and the blob-store layout the actions use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub parts_collection: String,
    pub categories_collection: String,
    /// Key prefix for uploaded images.
    pub storage_prefix: String,
    /// Public download-URL base; image deletion only touches URLs under it.
    pub storage_public_base: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            parts_collection: "parts".to_string(),
            categories_collection: "categories".to_string(),
            storage_prefix: "parts".to_string(),
            storage_public_base: "https://storage.example.com/v0/b/stockroom".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// Bound on part create/update round-trips. Losing the race against this
    /// timer stops the local wait only; the remote write is not cancelled.
    pub timeout_secs: u64,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            backend: BackendConfig::default(),
            write: WriteConfig::default(),
        }
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write.timeout_secs)
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("STOCKROOM_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("stockroom").join("config.toml"))
}
