use std::fs;
use std::path::PathBuf;

use surveyforge_core::{CellValue, Column, GeneratedTable};
use surveyforge_eval::{EvalError, EvaluateOptions, EvaluationEngine, read_table_csv};
use surveyforge_generate::{GenerationEngine, table_to_csv_string};
use surveyforge_plan::{CategoricalVarSpec, SurveyPlan};

fn example_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../plans/examples")
        .join(name)
}

fn load_json_plan() -> SurveyPlan {
    let path = example_path("survey.plan.json");
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing plan at {}", path.display()));
    serde_json::from_str(&contents).expect("parse plan")
}

fn load_measures_plan() -> SurveyPlan {
    let path = example_path("measures.plan.json");
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing plan at {}", path.display()));
    serde_json::from_str(&contents).expect("parse plan")
}

fn load_toml_plan() -> SurveyPlan {
    let path = example_path("cronbach.plan.toml");
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing plan at {}", path.display()));
    toml::from_str(&contents).expect("parse plan")
}

#[test]
fn example_plan_evaluates_without_deviations() {
    let plan = load_json_plan();
    let generated = GenerationEngine::default().generate(&plan).expect("generate");
    let result = EvaluationEngine::default()
        .evaluate(&plan, &generated.table, Some(&generated.report))
        .expect("evaluate");

    let metrics = &result.metrics;
    assert_eq!(metrics.run_id, generated.report.run_id);
    assert_eq!(metrics.plan_ref.seed, Some(42));
    assert_eq!(metrics.rows_found, 500);
    assert_eq!(metrics.scales.len(), 3);
    for scale in &metrics.scales {
        let alpha = scale.cronbach_alpha.expect("alpha defined");
        assert!(alpha > 0.5, "{} alpha {alpha}", scale.variable);
    }
    assert_eq!(metrics.score_correlations.len(), 3);
    assert!(metrics
        .score_correlations
        .iter()
        .all(|pair| pair.observed.expect("defined") > 0.0));
    assert_eq!(metrics.continuous.len(), 2);
    assert_eq!(metrics.categorical[0].frequencies.len(), 2);
    assert!(result.deviations.is_empty(), "{:?}", result.deviations);
    assert!(result.report.starts_with("# Surveyforge Evaluation Report"));
    assert!(result.report.contains("| Trust |"));
}

#[test]
fn target_alpha_plan_reaches_its_alpha() {
    let plan = load_toml_plan();
    let generated = GenerationEngine::default().generate(&plan).expect("generate");
    let result = EvaluationEngine::new(EvaluateOptions {
        strict: true,
        ..EvaluateOptions::default()
    })
    .evaluate(&plan, &generated.table, None)
    .expect("alpha within tolerance");

    let scale = &result.metrics.scales[0];
    assert_eq!(scale.target_alpha, Some(0.8));
    let alpha = scale.cronbach_alpha.expect("alpha defined");
    assert!((alpha - 0.8).abs() < 0.1, "alpha {alpha}");
    assert_eq!(result.metrics.run_id, "unknown");
}

#[test]
fn csv_round_trip_restores_the_table() {
    let mut plan = load_json_plan();
    plan.emit_latent_scores = true;
    plan.sample_count = 50;
    let generated = GenerationEngine::default().generate(&plan).expect("generate");
    let csv = table_to_csv_string(&generated.table).expect("csv");

    let loaded = read_table_csv(csv.as_bytes(), &plan).expect("read back");
    assert!(loaded.warnings.is_empty());
    assert_eq!(loaded.table, generated.table);
}

#[test]
fn unknown_and_missing_columns_are_reported() {
    let mut plan = SurveyPlan::new(2);
    plan.categorical = vec![CategoricalVarSpec::new("Group", &["A", "B"], &[0.5, 0.5])];
    let csv = "Other\nx\ny\n";

    let loaded = read_table_csv(csv.as_bytes(), &plan).expect("read");
    let codes: Vec<&str> = loaded
        .warnings
        .iter()
        .map(|warning| warning.code.as_str())
        .collect();
    assert_eq!(codes, vec!["missing_columns", "extra_columns"]);

    let result = EvaluationEngine::default()
        .evaluate_loaded(&plan, &loaded, None)
        .expect("evaluate");
    assert!(result
        .metrics
        .warnings
        .iter()
        .any(|warning| warning.code == "missing_column"));
}

#[test]
fn malformed_cells_are_rejected() {
    let mut plan = SurveyPlan::new(1);
    plan.variables = vec![surveyforge_plan::VariableSpec::new("X", 2)];
    let csv = "X_Q1,X_Q2\n3,three\n";

    let err = read_table_csv(csv.as_bytes(), &plan).expect_err("must fail");
    assert!(matches!(err, EvalError::InvalidDataset(ref message) if message.contains("X_Q2")));
}

#[test]
fn skewed_frequencies_are_deviations() {
    let mut plan = SurveyPlan::new(10);
    plan.categorical = vec![CategoricalVarSpec::new("Group", &["A", "B"], &[0.5, 0.5])];
    let labels = ["A", "A", "A", "A", "A", "A", "A", "A", "B", "C"];
    let table = GeneratedTable::try_new(
        10,
        vec![Column::new(
            "Group",
            labels
                .iter()
                .map(|label| CellValue::Text(label.to_string()))
                .collect(),
        )],
    )
    .expect("table");

    let relaxed = EvaluationEngine::default()
        .evaluate(&plan, &table, None)
        .expect("evaluate");
    let codes: Vec<&str> = relaxed
        .deviations
        .iter()
        .map(|deviation| deviation.code.as_str())
        .collect();
    assert_eq!(
        codes,
        vec!["frequency_out_of_tolerance", "frequency_out_of_tolerance"]
    );
    assert!(relaxed
        .metrics
        .warnings
        .iter()
        .any(|warning| warning.code == "unexpected_category"));
    assert!(relaxed.report.contains("## Top deviations"));

    let strict = EvaluationEngine::new(EvaluateOptions {
        strict: true,
        ..EvaluateOptions::default()
    });
    assert!(matches!(
        strict.evaluate(&plan, &table, None),
        Err(EvalError::Deviations(2))
    ));
}

#[test]
fn regressed_pairs_have_no_latent_target() {
    let plan = load_json_plan();
    let generated = GenerationEngine::default().generate(&plan).expect("generate");
    let result = EvaluationEngine::default()
        .evaluate(&plan, &generated.table, Some(&generated.report))
        .expect("evaluate");

    for pair in &result.metrics.score_correlations {
        if pair.left == "Loyalty" || pair.right == "Loyalty" {
            assert_eq!(pair.latent_target, None, "{} / {}", pair.left, pair.right);
        } else {
            assert_eq!(pair.latent_target, Some(0.4));
        }
    }
}

#[test]
fn outcomes_and_quartile_labels_are_evaluated() {
    let plan = load_measures_plan();
    let generated = GenerationEngine::default().generate(&plan).expect("generate");
    let result = EvaluationEngine::default()
        .evaluate(&plan, &generated.table, Some(&generated.report))
        .expect("evaluate");
    assert!(result.deviations.is_empty(), "{:?}", result.deviations);

    let metrics = &result.metrics;
    let outcome = metrics
        .continuous
        .iter()
        .find(|metric| metric.name == "Y")
        .expect("outcome metrics");
    assert!((outcome.target_mean - 110.0).abs() < 1e-9);
    assert!((outcome.target_std - 425_f64.sqrt()).abs() < 1e-9);

    let quartiles = metrics
        .categorical
        .iter()
        .find(|metric| metric.name == "Visits")
        .expect("quartile metrics");
    assert_eq!(quartiles.frequencies.len(), 4);
    assert!(metrics.continuous.iter().all(|metric| metric.name != "Visits"));
}

#[test]
fn quartile_labels_read_back_as_text() {
    let plan = load_measures_plan();
    let generated = GenerationEngine::default().generate(&plan).expect("generate");
    let csv = table_to_csv_string(&generated.table).expect("csv");
    let loaded = read_table_csv(csv.as_bytes(), &plan).expect("read back");

    let visits = loaded.table.column("Visits").expect("Visits column");
    assert!(visits.values.iter().all(|cell| matches!(cell, CellValue::Text(_))));
    let outcome = loaded.table.column("Y").expect("Y column");
    assert!(outcome.numeric_values().is_some());
}
