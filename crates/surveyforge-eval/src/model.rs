use serde::{Deserialize, Serialize};

use crate::metrics::MetricsReport;

/// Options for dataset evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateOptions {
    /// Fail when any deviation exceeds its tolerance.
    pub strict: bool,
    /// Limit the number of deviations listed in the report.
    pub max_examples: usize,
    /// Allowed absolute gap between observed and expected category shares.
    pub frequency_tolerance: f64,
    /// Allowed gap between observed and target mean, in target standard deviations.
    pub mean_tolerance_sd: f64,
    /// Allowed absolute gap between observed and target Cronbach's alpha.
    pub alpha_tolerance: f64,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_examples: 20,
            frequency_tolerance: 0.05,
            mean_tolerance_sd: 0.25,
            alpha_tolerance: 0.1,
        }
    }
}

/// Observed statistic outside its tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    pub code: String,
    pub path: String,
    pub message: String,
    pub observed: f64,
    pub expected: f64,
}

/// Result of a dataset evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub metrics: MetricsReport,
    /// Markdown rendering of `metrics` and `deviations`.
    pub report: String,
    pub deviations: Vec<Deviation>,
}
