//! Zhicuoti Client
//!
//! HTTP access to the Zhicuoti backend: login, current user, and the streamed
//! AI analysis endpoints (problem solutions, subject and tag analysis for
//! students, individual students and whole classes).
//!
//! Streamed bodies are handed to `zhicuoti-core`'s decoder, so callers only
//! ever see text increments.

pub mod api;
pub mod http_client;
pub mod types;

pub use api::{parse_http_error, AnalysisFetch, ApiClient};
pub use http_client::build_http_client;
pub use types::*;
