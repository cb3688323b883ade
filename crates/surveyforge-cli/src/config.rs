use std::path::Path;

use serde_json::Value;
use surveyforge_plan::{
    ValidatedPlan, ValidationReport, plan_json_schema, validate_plan_document,
};

use crate::CliError;

/// Read a plan document from `.toml` or `.json` into a JSON value.
pub(crate) fn load_plan_document(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        let value: toml::Value = toml::from_str(&contents)?;
        Ok(serde_json::to_value(value)?)
    } else {
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Load and fully validate a plan, printing every issue when it fails.
pub(crate) fn load_plan(path: &Path) -> Result<ValidatedPlan, CliError> {
    let document = load_plan_document(path)?;
    let schema = serde_json::to_value(plan_json_schema())?;
    validate_plan_document(&document, &schema).map_err(|report| {
        print_report(&report);
        CliError::InvalidPlan(format!(
            "{} failed validation with {} error(s)",
            path.display(),
            report.errors.len()
        ))
    })
}

pub(crate) fn print_report(report: &ValidationReport) {
    for issue in report.issues() {
        eprintln!("{issue}");
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn example(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../plans/examples")
            .join(name)
    }

    #[test]
    fn toml_and_json_plans_load() {
        let toml_plan = load_plan(&example("cronbach.plan.toml")).expect("toml plan");
        assert_eq!(toml_plan.plan.sample_count, 1000);
        assert_eq!(toml_plan.plan.seed, Some(7));

        let json_plan = load_plan(&example("survey.plan.json")).expect("json plan");
        assert_eq!(json_plan.plan.variables.len(), 3);
        assert!(json_plan.warnings.is_empty());
    }

    #[test]
    fn invalid_plan_is_reported() {
        let dir = std::env::temp_dir().join(format!("surveyforge_cli_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("bad.plan.json");
        std::fs::write(
            &path,
            r#"{"plan_version":"0.1","sample_count":10,
               "categorical":[{"name":"G","categories":["A","B"],"probabilities":[0.5,0.6]}]}"#,
        )
        .expect("write plan");

        let err = load_plan(&path).expect_err("must fail");
        assert!(matches!(err, CliError::InvalidPlan(_)));
    }
}
