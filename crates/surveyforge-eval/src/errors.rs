use thiserror::Error;

use surveyforge_core::Error as CoreError;
use surveyforge_plan::PlanError;

/// Errors emitted by the evaluation engine.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("evaluation found {0} deviation(s) beyond tolerance")]
    Deviations(u64),
    #[error(transparent)]
    Table(#[from] CoreError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
