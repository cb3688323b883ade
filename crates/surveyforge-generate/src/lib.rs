//! Survey data generation pipeline.
//!
//! Correlated latent traits are sampled from a validated correlation matrix,
//! optionally pass through a linear regression that derives one trait from
//! the others, and are discretized into Likert items. Independent continuous
//! columns, outcomes regressed on them, and categorical columns are appended
//! and the whole is assembled into one immutable table. Every stage draws from its own seeded stream, so a plan
//! with a seed always yields the same table.

pub mod assemble;
pub mod categorical;
pub mod discretize;
pub mod engine;
pub mod errors;
pub mod model;
pub mod output;
pub mod regression;
pub mod sampler;
pub mod solver;

pub use assemble::TableAssembler;
pub use categorical::CategoricalSampler;
pub use discretize::{
    ContinuousSampler, continuous_column, likert_item, likert_response, quartile_labels,
    round_column, round_value, standard_normal_cdf,
};
pub use engine::{
    GenerationEngine, GenerationResult, LATENT_SCORE_DECIMALS, PreparedPlan, hash_seed,
};
pub use errors::GenerationError;
pub use model::{ColumnKind, ColumnReport, GenerateOptions, GenerationIssue, GenerationReport};
pub use output::{table_to_csv_string, write_table_csv, write_table_csv_file};
pub use regression::{OutcomeModel, RegressionModel};
pub use sampler::{LatentMatrix, LatentSampler};
pub use solver::{
    AlphaStructure, alpha_structure, inter_item_correlation, standardized_alpha,
    uniform_correlation_matrix,
};
