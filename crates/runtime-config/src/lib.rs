//! Runtime configuration for webhook-tui.
//!
//! The file lives at `~/.webhook-tui/config.toml`. Every field has a default,
//! so a missing file (or a missing table) yields the stock behaviour: listen on
//! 8098, expire the tunnel after 30 minutes, and tunnel through
//! `npx localtunnel`.

pub mod paths;
pub mod setup;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use setup::{ListenerConfig, SetupField, SetupInput};

/// Canonical config file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory (HOME/USERPROFILE unset)")]
    HomeUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid port {0:?}: expected a number between 1 and 65535")]
    InvalidPort(String),
}

/// Top-level configuration (persisted as `config.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WebhookTuiConfig {
    #[serde(default)]
    pub listener: ListenerSettings,
    #[serde(default)]
    pub tunnel: TunnelSettings,
    #[serde(default)]
    pub public_ip: PublicIpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenerSettings {
    /// Used when the port field is left empty.
    #[serde(default = "default_port")]
    pub default_port: u16,
    /// Used when the timeout field is empty, unparseable, or not positive.
    #[serde(default = "default_timeout_minutes")]
    pub default_timeout_minutes: u64,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            default_port: default_port(),
            default_timeout_minutes: default_timeout_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TunnelSettings {
    #[serde(default = "default_tunnel_command")]
    pub command: String,
    /// Arguments placed before `--port`/`--subdomain`.
    #[serde(default = "default_tunnel_args")]
    pub args: Vec<String>,
}

impl Default for TunnelSettings {
    fn default() -> Self {
        Self {
            command: default_tunnel_command(),
            args: default_tunnel_args(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicIpSettings {
    /// Tried in order; the first success wins.
    #[serde(default = "default_ip_endpoints")]
    pub endpoints: Vec<String>,
    #[serde(default = "default_ip_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PublicIpSettings {
    fn default() -> Self {
        Self {
            endpoints: default_ip_endpoints(),
            timeout_secs: default_ip_timeout_secs(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_port() -> u16 {
    8098
}
fn default_timeout_minutes() -> u64 {
    30
}
fn default_tunnel_command() -> String {
    "npx".to_string()
}
fn default_tunnel_args() -> Vec<String> {
    vec!["localtunnel".to_string()]
}
fn default_ip_endpoints() -> Vec<String> {
    vec![
        "https://api.ipify.org".to_string(),
        "https://ifconfig.me/ip".to_string(),
    ]
}
fn default_ip_timeout_secs() -> u64 {
    10
}

/// Load configuration from the default per-user location.
/// A missing file yields defaults.
pub fn load_config() -> Result<WebhookTuiConfig, ConfigError> {
    let path = paths::config_path()?;
    load_config_from(&path)
}

/// Load configuration from `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<WebhookTuiConfig, ConfigError> {
    if !path.exists() {
        return Ok(WebhookTuiConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: WebhookTuiConfig =
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    apply_fallbacks(&mut config);
    Ok(config)
}

/// Repair values that parse but cannot be used. Returns true when any field changed.
pub fn apply_fallbacks(config: &mut WebhookTuiConfig) -> bool {
    let mut changed = false;

    if config.listener.default_port == 0 {
        config.listener.default_port = default_port();
        changed = true;
    }
    if config.listener.default_timeout_minutes == 0 {
        config.listener.default_timeout_minutes = default_timeout_minutes();
        changed = true;
    }
    if config.tunnel.command.trim().is_empty() {
        config.tunnel = TunnelSettings::default();
        changed = true;
    }
    if config.public_ip.endpoints.is_empty() {
        config.public_ip.endpoints = default_ip_endpoints();
        changed = true;
    }

    changed
}
