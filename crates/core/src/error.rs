//! Core Error Types
//!
//! Error types shared by every crate in the Zhicuoti workspace. The client and
//! application crates wrap these in their own enums.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for the Zhicuoti workspace.
#[derive(Error, Debug)]
pub enum CoreError {
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

    /// Operation requires a logged-in session
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// Reading the response body failed mid-stream
    #[error(transparent)]
    TransportRead(#[from] TransportReadError),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-authenticated error
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::NotAuthenticated(msg.into())
    }
}

impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}

/// A read from the underlying transport failed while a text stream was being
/// consumed. No increment is produced for the failed read.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Transport read error: {message}")]
pub struct TransportReadError {
    pub message: String,
}

impl TransportReadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
