//! Business Logic Services

pub mod analysis;

pub use analysis::{
    AnalysisBoard, AnalysisView, FetchPolicy, ViewOutcome, ViewSnapshot, ViewStatus,
};
