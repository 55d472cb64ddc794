//! Settings Models
//!
//! Client configuration stored in ~/.zhicuoti/config.json.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use zhicuoti_client::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS};
use zhicuoti_core::DecodeMode;

/// Environment variable that overrides `base_url`
pub const BASE_URL_ENV: &str = "API_BASE_URL";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// API base URL, e.g. "http://localhost:8000/api/v1"
    pub base_url: String,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// How streamed analysis bytes are decoded
    #[serde(default)]
    pub decode_mode: DecodeMode,
    /// Optional proxy URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Default log level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            decode_mode: DecodeMode::default(),
            proxy: None,
            log_level: default_log_level(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub base_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub decode_mode: Option<DecodeMode>,
    /// `Some(None)` clears the proxy
    pub proxy: Option<Option<String>>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(base_url) = update.base_url {
            self.base_url = base_url;
        }
        if let Some(secs) = update.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if let Some(mode) = update.decode_mode {
            self.decode_mode = mode;
        }
        if let Some(proxy) = update.proxy {
            self.proxy = proxy;
        }
        if let Some(level) = update.log_level {
            self.log_level = level;
        }
    }

    /// Apply overrides from the environment. `lookup` is `std::env::var` in
    /// production and a closure in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(%base_url, "base_url overridden from environment");
            self.base_url = base_url;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err("connect_timeout_secs must be greater than 0".to_string());
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!(
                "log_level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.log_level
            ));
        }
        Ok(())
    }

    pub fn to_client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            proxy: self.proxy.clone(),
            decode_mode: self.decode_mode,
        }
    }
}
