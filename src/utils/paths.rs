//! Path Utilities
//!
//! Resolves the Zhicuoti directory (~/.zhicuoti/) and files inside it.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Zhicuoti directory (~/.zhicuoti/)
pub fn zhicuoti_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".zhicuoti"))
}

/// Get the config file path (~/.zhicuoti/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(zhicuoti_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
