//! Zhicuoti - Streaming Analysis Client
//!
//! Client for the Zhicuoti mistake-notebook backend. Problem solutions and
//! subject / tag analyses are generated by the backend and streamed back as
//! plain UTF-8 text; this crate renders them incrementally.
//!
//! It includes:
//! - Analysis views that fold streamed increments into displayable text
//! - Application state (configuration, API client, session)
//! - Configuration storage and the command-line interface

pub mod cli;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::analysis::{AnalysisBoard, AnalysisView, FetchPolicy, ViewOutcome, ViewStatus};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
