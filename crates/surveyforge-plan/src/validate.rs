use std::collections::HashSet;

use jsonschema::JSONSchema;
use serde_json::Value;
use surveyforge_core::{CorrelationMatrix, Error, Result};

use crate::errors::{PlanError, ValidationIssue, ValidationReport, codes};
use crate::model::{LatentModel, PLAN_VERSION, SurveyPlan};

/// Below this many rows empirical correlations drift visibly from the target.
const SMALL_SAMPLE_WARNING: usize = 30;

/// Semantically valid plan with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub plan: SurveyPlan,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a plan JSON document against the plan JSON Schema.
pub fn validate_plan_json(
    plan_json: &Value,
    plan_schema: &Value,
) -> std::result::Result<ValidationReport, PlanError> {
    let compiled =
        JSONSchema::compile(plan_schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(plan_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                codes::SCHEMA_VIOLATION,
                path,
                error.to_string(),
            ));
        }
    }

    Ok(report)
}

/// Check every semantic invariant of a plan.
///
/// Runs before any sampling; the first violation is returned with the
/// offending parameter path so the caller can correct the configuration.
pub fn validate_plan(plan: &SurveyPlan) -> Result<ValidatedPlan> {
    if plan.plan_version != PLAN_VERSION {
        return Err(Error::invalid_parameter(
            "/plan_version",
            format!(
                "unsupported plan version '{}', expected '{PLAN_VERSION}'",
                plan.plan_version
            ),
        ));
    }
    if plan.sample_count == 0 {
        return Err(Error::invalid_parameter(
            "/sample_count",
            "must be at least 1",
        ));
    }
    if !plan.item_jitter_std.is_finite() || plan.item_jitter_std < 0.0 {
        return Err(Error::invalid_parameter(
            "/item_jitter_std",
            format!("must be finite and >= 0, found {}", plan.item_jitter_std),
        ));
    }
    if plan.variables.is_empty() && plan.continuous.is_empty() && plan.categorical.is_empty() {
        return Err(Error::invalid_parameter(
            "/",
            "plan declares no variables, continuous or categorical columns",
        ));
    }

    validate_names(plan)?;
    validate_latent(plan)?;

    if let Some(regression) = &plan.regression {
        if matches!(plan.latent, Some(LatentModel::TargetAlpha { .. })) {
            return Err(Error::invalid_parameter(
                "/regression",
                "regression requires a correlation_matrix latent model over variables",
            ));
        }
        regression.validate(&plan.variable_names())?;
    }

    for (idx, spec) in plan.continuous.iter().enumerate() {
        spec.validate(&format!("/continuous/{idx}"))?;
    }
    for (idx, spec) in plan.outcomes.iter().enumerate() {
        spec.validate(&format!("/outcomes/{idx}"), &plan.continuous)?;
    }
    for (idx, spec) in plan.categorical.iter().enumerate() {
        spec.validate(&format!("/categorical/{idx}"))?;
    }

    Ok(ValidatedPlan {
        plan: plan.clone(),
        warnings: collect_warnings(plan),
    })
}

/// Validate a raw plan document end-to-end, returning structured issues on failure.
pub fn validate_plan_document(
    plan_json: &Value,
    plan_schema: &Value,
) -> std::result::Result<ValidatedPlan, ValidationReport> {
    let structural = match validate_plan_json(plan_json, plan_schema) {
        Ok(report) => report,
        Err(err) => {
            return Err(ValidationReport::rejected(ValidationIssue::error(
                codes::SCHEMA_UNAVAILABLE,
                "/",
                err.to_string(),
            )));
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let plan: SurveyPlan = match serde_json::from_value(plan_json.clone()) {
        Ok(plan) => plan,
        Err(err) => {
            return Err(ValidationReport::rejected(ValidationIssue::error(
                codes::INVALID_PLAN_JSON,
                "/",
                err.to_string(),
            )));
        }
    };

    validate_plan(&plan).map_err(|err| ValidationReport::rejected(ValidationIssue::from_error(&err)))
}

fn validate_names(plan: &SurveyPlan) -> Result<()> {
    let mut variables = HashSet::new();
    for (idx, variable) in plan.variables.iter().enumerate() {
        let path = format!("/variables/{idx}");
        if variable.name.trim().is_empty() {
            return Err(Error::invalid_parameter(
                format!("{path}/name"),
                "name must not be empty",
            ));
        }
        if !variables.insert(variable.name.as_str()) {
            return Err(Error::invalid_parameter(
                format!("{path}/name"),
                format!("duplicate variable name '{}'", variable.name),
            ));
        }
        if variable.item_count == 0 {
            return Err(Error::invalid_parameter(
                format!("{path}/item_count"),
                "must be at least 1",
            ));
        }
        if !variable.mean.is_finite() {
            return Err(Error::invalid_parameter(
                format!("{path}/mean"),
                "must be finite",
            ));
        }
    }

    for (idx, spec) in plan.continuous.iter().enumerate() {
        if spec.name.trim().is_empty() {
            return Err(Error::invalid_parameter(
                format!("/continuous/{idx}/name"),
                "name must not be empty",
            ));
        }
    }
    for (idx, spec) in plan.outcomes.iter().enumerate() {
        if spec.name.trim().is_empty() {
            return Err(Error::invalid_parameter(
                format!("/outcomes/{idx}/name"),
                "name must not be empty",
            ));
        }
    }
    for (idx, spec) in plan.categorical.iter().enumerate() {
        if spec.name.trim().is_empty() {
            return Err(Error::invalid_parameter(
                format!("/categorical/{idx}/name"),
                "name must not be empty",
            ));
        }
    }

    let mut columns = HashSet::new();
    for name in plan.column_names() {
        if !columns.insert(name.clone()) {
            return Err(Error::DuplicateColumnName(name));
        }
    }
    Ok(())
}

fn validate_latent(plan: &SurveyPlan) -> Result<()> {
    match &plan.latent {
        None => Ok(()),
        Some(LatentModel::CorrelationMatrix { matrix }) => {
            if matrix.len() != plan.variables.len() {
                return Err(Error::mismatched_length(
                    "/latent/matrix",
                    plan.variables.len(),
                    matrix.len(),
                ));
            }
            CorrelationMatrix::from_rows("/latent/matrix", matrix).map(|_| ())
        }
        Some(LatentModel::TargetAlpha { target_alpha }) => {
            if !target_alpha.is_finite() || !(0.0..1.0).contains(target_alpha) {
                return Err(Error::invalid_parameter(
                    "/latent/target_alpha",
                    format!("must lie in [0, 1), found {target_alpha}"),
                ));
            }
            for (idx, variable) in plan.variables.iter().enumerate() {
                if variable.item_count < 2 {
                    return Err(Error::invalid_parameter(
                        format!("/variables/{idx}/item_count"),
                        "target_alpha requires at least 2 items per variable",
                    ));
                }
            }
            Ok(())
        }
    }
}

fn collect_warnings(plan: &SurveyPlan) -> Vec<ValidationIssue> {
    let mut warnings = Vec::new();

    if !plan.variables.is_empty() && plan.sample_count < SMALL_SAMPLE_WARNING {
        warnings.push(ValidationIssue::warning(
            codes::SMALL_SAMPLE,
            "/sample_count",
            format!(
                "{} rows: empirical correlations will deviate noticeably from the target",
                plan.sample_count
            ),
            format!("use at least {SMALL_SAMPLE_WARNING} rows"),
        ));
    }

    if plan.variables.is_empty() && plan.latent.is_some() {
        warnings.push(ValidationIssue::warning(
            codes::LATENT_WITHOUT_VARIABLES,
            "/latent",
            "latent model is ignored because no variables are declared",
            "remove the latent section or declare variables",
        ));
    }

    if let Some(regression) = &plan.regression {
        let dependent = plan
            .variables
            .iter()
            .position(|variable| variable.name == regression.dependent_variable);
        if let Some(idx) = dependent.filter(|idx| plan.variables[*idx].mean != 0.0) {
            warnings.push(ValidationIssue::warning(
                codes::DEPENDENT_MEAN_IGNORED,
                format!("/variables/{idx}/mean"),
                format!(
                    "'{}' is overwritten by the regression, its mean has no effect",
                    regression.dependent_variable
                ),
                "shift the dependent variable through /regression/intercept",
            ));
        }
    }

    warnings
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
