//! Console configuration.
//!
//! A small TOML file under the user's config directory; every field has a
//! default so the binary runs without one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default messages-service base URL. The service only answers over HTTPS;
/// plain HTTP requests are dropped at the socket.
const DEFAULT_BASE_URL: &str = "https://localhost:7016";

/// Top-level settings file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub chat: ChatSettings,
}

/// Messages service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL of the messages service.
    pub base_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Chat widget tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatSettings {
    /// Seconds before an unconfirmed optimistic message is flagged failed.
    pub pending_timeout_secs: u64,
    /// Seconds between stalled-placeholder sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            pending_timeout_secs: 30,
            sweep_interval_secs: 5,
        }
    }
}

impl Settings {
    /// Default config file location (e.g. `~/.config/flowdesk/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flowdesk").join("config.toml"))
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Load from the given path, or the default location, falling back to
    /// defaults when no file exists. A file that exists but fails to parse is
    /// an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };
        match path {
            Some(ref p) if p.exists() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }
}
