//! Client Types
//!
//! Error type, settings, request targets and auth payloads for the backend API.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zhicuoti_core::DecodeMode;

/// Default API base URL, used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Errors
// ============================================================================

/// Errors returned by the API client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Request could not be sent or the connection dropped
    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// Bad credentials or rejected token
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// 400-class errors other than auth / not found
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Server error: {message}")]
    ServerError { message: String, status: Option<u16> },

    /// Body could not be parsed
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Client settings are unusable (bad base URL or proxy)
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{message}")]
    Other { message: String },
}

/// Result type alias for client errors
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse {
                message: err.to_string(),
            }
        } else if err.is_connect() {
            ClientError::NetworkError {
                message: format!("Connection failed: {}", err),
            }
        } else {
            ClientError::NetworkError {
                message: err.to_string(),
            }
        }
    }
}

impl From<ClientError> for String {
    fn from(err: ClientError) -> String {
        err.to_string()
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Everything needed to build an [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub base_url: String,
    /// Bounds connection setup only; streamed bodies have no deadline.
    pub connect_timeout: Duration,
    /// Proxy URL such as `http://127.0.0.1:7890` or `socks5://host:1080`
    pub proxy: Option<String>,
    pub decode_mode: DecodeMode,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            proxy: None,
            decode_mode: DecodeMode::default(),
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ClientError::config(format!("invalid base_url {}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::config(format!(
                "base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if let Some(proxy) = &self.proxy {
            url::Url::parse(proxy)
                .map_err(|e| ClientError::config(format!("invalid proxy {}: {}", proxy, e)))?;
        }
        Ok(())
    }

    /// Append path segments to the base URL, percent-encoding each one so an
    /// ID containing `/`, `?` or `#` stays a single segment.
    pub fn endpoint_url(&self, segments: &[&str]) -> ClientResult<url::Url> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| ClientError::config(format!("invalid base_url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::config(format!("base_url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Join a fixed endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// ============================================================================
// Auth payloads
// ============================================================================

/// `POST /auth/login` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

// ============================================================================
// Analysis targets
// ============================================================================

/// What a streamed analysis is about; drives the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    Solution,
    Subject,
    Tag,
}

impl AnalysisKind {
    /// Notice shown when a 200 response arrives without a body.
    pub fn missing_body_notice(&self) -> &'static str {
        match self {
            AnalysisKind::Solution => "Unable to fetch the problem solution",
            AnalysisKind::Subject => "Unable to fetch the subject analysis",
            AnalysisKind::Tag => "Unable to fetch the tag analysis",
        }
    }
}

/// A streaming AI endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisTarget {
    /// AI solution for one problem
    ProblemSolution { problem_id: String },
    /// Student's own analysis for a subject
    MySubject { subject_id: String },
    /// Student's own analysis for a knowledge tag
    MyTag { tag_id: String },
    /// Teacher view of one student's subject
    StudentSubject { user_id: String, subject_id: String },
    /// Teacher view of one student's tag
    StudentTag { user_id: String, tag_id: String },
    /// Teacher view of a whole class's subject
    ClassSubject { class_id: String, subject_id: String },
    /// Teacher view of a whole class's tag
    ClassTag { class_id: String, tag_id: String },
}

impl AnalysisTarget {
    /// Path segments relative to the API base URL, IDs unencoded.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            AnalysisTarget::ProblemSolution { problem_id } => {
                vec!["problem", problem_id.as_str(), "solution"]
            }
            AnalysisTarget::MySubject { subject_id } => {
                vec!["analyze", "me", "subject", subject_id.as_str(), "ai"]
            }
            AnalysisTarget::MyTag { tag_id } => vec!["analyze", "me", "tag", tag_id.as_str(), "ai"],
            AnalysisTarget::StudentSubject {
                user_id,
                subject_id,
            } => vec![
                "analyze",
                "student",
                user_id.as_str(),
                "subject",
                subject_id.as_str(),
                "ai",
            ],
            AnalysisTarget::StudentTag { user_id, tag_id } => {
                vec!["analyze", "student", user_id.as_str(), "tag", tag_id.as_str(), "ai"]
            }
            AnalysisTarget::ClassSubject {
                class_id,
                subject_id,
            } => vec!["analyze", class_id.as_str(), "subject", subject_id.as_str(), "ai"],
            AnalysisTarget::ClassTag { class_id, tag_id } => {
                vec!["analyze", class_id.as_str(), "tag", tag_id.as_str(), "ai"]
            }
        }
    }

    /// Readable path for logs. Requests go through [`ClientSettings::endpoint_url`],
    /// which percent-encodes each segment.
    pub fn path(&self) -> String {
        self.segments()
            .iter()
            .fold(String::new(), |mut path, segment| {
                path.push('/');
                path.push_str(segment);
                path
            })
    }

    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisTarget::ProblemSolution { .. } => AnalysisKind::Solution,
            AnalysisTarget::MySubject { .. }
            | AnalysisTarget::StudentSubject { .. }
            | AnalysisTarget::ClassSubject { .. } => AnalysisKind::Subject,
            AnalysisTarget::MyTag { .. }
            | AnalysisTarget::StudentTag { .. }
            | AnalysisTarget::ClassTag { .. } => AnalysisKind::Tag,
        }
    }
}

impl fmt::Display for AnalysisTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
