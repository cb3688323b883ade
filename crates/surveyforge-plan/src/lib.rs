//! Survey plan contracts and validation.
//!
//! A `SurveyPlan` is the single immutable configuration object handed to the
//! generator. This crate owns its serde/JSON Schema contract, structural
//! validation of raw JSON, and the semantic checks that must pass before any
//! value is sampled.

pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{IssueSeverity, PlanError, ValidationIssue, ValidationReport, codes};
pub use model::{
    CategoricalVarSpec, ContinuousVarSpec, DEFAULT_ITEM_JITTER_STD, DEFAULT_NOISE_STD,
    Distribution, INTEGER_RANGE_SDS, LatentModel, LikertScale, MAX_EXACT_INTEGER, OutcomeSpec,
    PLAN_VERSION, PROBABILITY_TOLERANCE, QUARTILE_LABELS, RegressionSpec, RoundingMode,
    SurveyPlan, VariableSpec,
};
pub use schema::{plan_fingerprint, plan_json_schema};
pub use validate::{ValidatedPlan, validate_plan, validate_plan_document, validate_plan_json};
