use schemars::schema::RootSchema;
use schemars::schema_for;
use sha2::{Digest, Sha256};

use crate::errors::PlanError;
use crate::model::SurveyPlan;

/// Emit the JSON Schema for survey plan documents.
pub fn plan_json_schema() -> RootSchema {
    schema_for!(SurveyPlan)
}

/// SHA-256 over the canonical JSON encoding of the plan.
///
/// Coefficients are stored in a `BTreeMap`, so equal plans hash equally.
pub fn plan_fingerprint(plan: &SurveyPlan) -> Result<String, PlanError> {
    let encoded = serde_json::to_vec(plan)?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(hex::encode(hasher.finalize()))
}
