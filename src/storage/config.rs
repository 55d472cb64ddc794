//! JSON Configuration Management
//!
//! Reads and writes the client configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for client settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load ~/.zhicuoti/config.json, creating it with defaults if missing
    pub fn new() -> AppResult<Self> {
        Self::open(config_path()?)
    }

    /// Load a config file at `path`, creating it with defaults if missing
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        if let Some(parent) = config_path.parent() {
            ensure_dir(parent)?;
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Config with process environment overrides applied. The file is not
    /// touched and the result is not validated; callers layer their own
    /// overrides on top and validate once.
    pub fn effective_config(&self) -> AppConfig {
        self.effective_config_with(|key| std::env::var(key).ok())
    }

    /// Like [`ConfigService::effective_config`] with an explicit variable lookup.
    pub fn effective_config_with<F>(&self, lookup: F) -> AppConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.config.clone();
        config.apply_env(lookup);
        config
    }

    /// Apply a partial update and persist it
    pub fn update_config(&mut self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let mut updated = self.config.clone();
        updated.apply_update(update);
        updated.validate().map_err(AppError::validation)?;
        Self::save_to_file(&self.config_path, &updated)?;
        self.config = updated;
        Ok(self.config.clone())
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.config = AppConfig::default();
        Self::save_to_file(&self.config_path, &self.config)
    }
}
