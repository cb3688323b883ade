use serde::{Deserialize, Serialize};

/// Metrics contract version for dataset evaluation.
pub const METRICS_VERSION: &str = "0.1";

/// Machine-readable metrics for a generated survey table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub metrics_version: String,
    pub run_id: String,
    pub plan_ref: MetricsPlanRef,
    pub rows_found: u64,
    pub rows_expected: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scales: Vec<ScaleMetrics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub score_correlations: Vec<ScoreCorrelation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub continuous: Vec<ContinuousMetrics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categorical: Vec<CategoricalMetrics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<WarningItem>,
    pub performance: PerformanceMetrics,
}

/// Reference metadata for plan inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsPlanRef {
    pub plan_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub plan_fingerprint: String,
}

/// Reliability of one Likert scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleMetrics {
    pub variable: String,
    pub items: u32,
    pub cronbach_alpha: Option<f64>,
    pub mean_inter_item_correlation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_alpha: Option<f64>,
}

/// Correlation between two scale scores (per-row item means).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCorrelation {
    pub left: String,
    pub right: String,
    pub observed: Option<f64>,
    /// Configured latent correlation; Likert discretization attenuates it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latent_target: Option<f64>,
}

/// Observed vs. configured moments of a continuous column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousMetrics {
    pub name: String,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub target_mean: f64,
    pub target_std: f64,
}

/// Observed vs. configured frequencies of a categorical column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalMetrics {
    pub name: String,
    pub frequencies: Vec<CategoryFrequency>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFrequency {
    pub category: String,
    pub count: u64,
    pub observed: f64,
    pub expected: f64,
}

/// Structured warning entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningItem {
    pub code: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Performance timings for the evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub evaluate_ms: u128,
}
