//! Configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Light device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightConfig {
    /// USB Vendor ID
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,
    /// USB Product ID
    #[serde(default = "default_product_id")]
    pub product_id: u16,
    /// Wait after reconnection before replaying the light state, in milliseconds
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    /// Attach/detach polling interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Brightness used when not dimmed (0.0-1.0)
    #[serde(default = "default_normal_brightness")]
    pub normal_brightness: f32,
    /// Brightness used when dimmed (0.0-1.0)
    #[serde(default = "default_dimmed_brightness")]
    pub dimmed_brightness: f32,
}

fn default_vendor_id() -> u16 {
    0x04D8
}
fn default_product_id() -> u16 {
    0xF372
}
fn default_settle_delay() -> u64 {
    2000
}
fn default_poll_interval() -> u64 {
    500
}
fn default_normal_brightness() -> f32 {
    1.0
}
fn default_dimmed_brightness() -> f32 {
    0.1
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            vendor_id: default_vendor_id(),
            product_id: default_product_id(),
            settle_delay_ms: default_settle_delay(),
            poll_interval_ms: default_poll_interval(),
            normal_brightness: default_normal_brightness(),
            dimmed_brightness: default_dimmed_brightness(),
        }
    }
}

impl LightConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Slack integration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// OAuth client ID of the Slack app
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret of the Slack app
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Base URL; the Web API lives under `{base_url}/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Redirect target registered with the Slack app
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Requested OAuth scope
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Snooze duration sent with `dnd.setSnooze`
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://slack.com".to_string()
}
fn default_redirect_uri() -> String {
    "https://traversal.space/luxaforus/slack".to_string()
}
fn default_scope() -> String {
    "dnd:write".to_string()
}
fn default_snooze_minutes() -> u32 {
    60 * 24
}
fn default_request_timeout() -> u64 {
    10
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: default_base_url(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
            snooze_minutes: default_snooze_minutes(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl SlackConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Light device configuration
    #[serde(default)]
    pub light: LightConfig,
    /// Slack integration configuration
    #[serde(default)]
    pub slack: SlackConfig,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, falling back to defaults if it is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            // Return default config if file doesn't exist
            Ok(Config::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the default configuration embedded in the binary
    pub fn default_config_str() -> &'static str {
        include_str!("../../config/default.toml")
    }
}

/// Platform directories for the application
pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("space", "traversal", "Busylight")
        .context("Failed to determine application directories")
}
