use thiserror::Error;

use surveyforge_core::Error as CoreError;
use surveyforge_plan::PlanError;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Configuration rejected before sampling.
    #[error(transparent)]
    Invalid(#[from] CoreError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    /// Strict mode refuses plans that validated with warnings.
    #[error("plan has warnings in strict mode: {0}")]
    StrictWarnings(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
