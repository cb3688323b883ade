//! Post-hoc evaluation of generated survey tables.
//!
//! Recomputes what a methods instructor would check on the output (scale
//! reliability, score correlations, moments and category shares) and compares
//! it with the plan's targets.

pub mod dataset;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod report;
pub mod stats;

pub use dataset::{LoadedTable, read_table_csv, read_table_csv_file};
pub use engine::EvaluationEngine;
pub use errors::EvalError;
pub use metrics::{
    CategoricalMetrics, CategoryFrequency, ContinuousMetrics, METRICS_VERSION, MetricsPlanRef,
    MetricsReport, PerformanceMetrics, ScaleMetrics, ScoreCorrelation, WarningItem,
};
pub use model::{Deviation, EvaluateOptions, EvaluationResult};
pub use report::render_report;
