//! Error Handling
//!
//! Application-wide error type wrapping the core and client errors.

use thiserror::Error;
use zhicuoti_client::ClientError;
use zhicuoti_core::CoreError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Analysis could not be shown (missing body, broken stream)
    #[error("Analysis failed: {0}")]
    Analysis(String),

    /// Backend API errors
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Core errors (session, stream reads)
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
