use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use surveyforge_core::{CellValue, Error};
use surveyforge_generate::{
    ColumnKind, GenerateOptions, GenerationEngine, GenerationError, table_to_csv_string,
};
use surveyforge_plan::{
    CategoricalVarSpec, ContinuousVarSpec, Distribution, LatentModel, LikertScale, OutcomeSpec,
    RegressionSpec, RoundingMode, SurveyPlan, VariableSpec,
};

fn load_plan(name: &str) -> SurveyPlan {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../plans/examples")
        .join(name);
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing plan at {}", path.display()));
    serde_json::from_str(&contents).expect("parse plan")
}

fn load_example_plan() -> SurveyPlan {
    load_plan("survey.plan.json")
}

fn alpha_plan(sample_count: usize, item_count: u32, target_alpha: f64) -> SurveyPlan {
    let mut plan = SurveyPlan::new(sample_count);
    plan.seed = Some(2024);
    plan.variables = vec![VariableSpec::new("item", item_count)];
    plan.latent = Some(LatentModel::TargetAlpha { target_alpha });
    plan
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    sxy / (sxx.sqrt() * syy.sqrt())
}

#[test]
fn example_plan_produces_expected_layout() {
    let plan = load_example_plan();
    let result = GenerationEngine::default()
        .generate(&plan)
        .expect("generate example plan");
    let table = &result.table;

    assert_eq!(table.row_count(), 500);
    assert_eq!(
        table.column_names(),
        vec![
            "Trust_Q1",
            "Trust_Q2",
            "Trust_Q3",
            "Satisfaction_Q1",
            "Satisfaction_Q2",
            "Satisfaction_Q3",
            "Satisfaction_Q4",
            "Loyalty_Q1",
            "Loyalty_Q2",
            "Loyalty_Q3",
            "Age",
            "Income",
            "Gender",
        ]
    );

    for name in plan.likert_column_names() {
        let column = table.column(&name).expect("likert column");
        assert!(column
            .values
            .iter()
            .all(|value| matches!(value, CellValue::Int(v) if (1..=5).contains(v))));
    }
    let age = table.column("Age").expect("age column");
    assert!(age.values.iter().all(|value| value.as_i64().is_some()));
    let income = table.column("Income").expect("income column");
    assert!(income
        .values
        .iter()
        .all(|value| matches!(value, CellValue::Float { decimals: 1, .. })));
    let gender = table.column("Gender").expect("gender column");
    assert!(gender
        .values
        .iter()
        .all(|value| matches!(value.as_str(), Some("F") | Some("M"))));

    let report = &result.report;
    assert_eq!(report.seed, 42);
    assert!(report.seed_from_plan);
    assert_eq!(report.dependent_variable.as_deref(), Some("Loyalty"));
    assert_eq!(report.columns_of_kind(ColumnKind::Likert).count(), 10);
    assert_eq!(report.plan_fingerprint.len(), 64);
}

#[test]
fn seeded_generation_is_deterministic() {
    let plan = load_example_plan();
    let engine = GenerationEngine::default();

    let first = engine.generate(&plan).expect("first run");
    let second = engine.generate(&plan).expect("second run");
    assert_eq!(first.table, second.table);
    assert_eq!(
        table_to_csv_string(&first.table).expect("csv"),
        table_to_csv_string(&second.table).expect("csv")
    );
    assert_ne!(first.report.run_id, second.report.run_id);

    let mut reseeded = plan.clone();
    reseeded.seed = Some(43);
    let third = engine.generate(&reseeded).expect("third run");
    assert_ne!(first.table, third.table);
}

#[test]
fn drawn_seed_is_recorded_and_replays() {
    let mut plan = alpha_plan(200, 3, 0.7);
    plan.seed = None;
    let engine = GenerationEngine::default();

    let first = engine.generate(&plan).expect("unseeded run");
    assert!(!first.report.seed_from_plan);

    plan.seed = Some(first.report.seed);
    let replay = engine.generate(&plan).expect("replay");
    assert_eq!(first.table, replay.table);
}

#[test]
fn target_alpha_scenario_yields_half_correlation_and_bounded_items() {
    let plan = alpha_plan(1000, 4, 0.8);
    let result = GenerationEngine::default()
        .generate(&plan)
        .expect("generate alpha plan");

    let r = result.report.inter_item_correlations["item"];
    assert!((r - 0.5).abs() < 1e-12);

    let table = &result.table;
    assert_eq!(table.row_count(), 1000);
    assert_eq!(table.column_count(), 4);
    assert_eq!(
        table.column_names(),
        vec!["item_Q1", "item_Q2", "item_Q3", "item_Q4"]
    );
    for column in table.columns() {
        assert!(column
            .values
            .iter()
            .all(|value| matches!(value, CellValue::Int(v) if (1..=5).contains(v))));
    }

    let q1 = table.column("item_Q1").and_then(|c| c.numeric_values()).expect("q1");
    let q2 = table.column("item_Q2").and_then(|c| c.numeric_values()).expect("q2");
    let observed = pearson(&q1, &q2);
    assert!(observed > 0.3 && observed < 0.6, "item correlation {observed}");
}

#[test]
fn categorical_scenario_matches_proportions() {
    let mut plan = SurveyPlan::new(10_000);
    plan.seed = Some(8);
    plan.categorical = vec![CategoricalVarSpec::new("Group", &["A", "B"], &[0.6, 0.4])];

    let result = GenerationEngine::default()
        .generate(&plan)
        .expect("generate categorical plan");
    let column = result.table.column("Group").expect("group column");
    let share = column
        .values
        .iter()
        .filter(|value| value.as_str() == Some("A"))
        .count() as f64
        / 10_000.0;
    assert!((0.58..=0.62).contains(&share), "share of A: {share}");
}

#[test]
fn invalid_probabilities_fail_before_sampling() {
    let mut plan = SurveyPlan::new(100);
    plan.seed = Some(1);
    plan.categorical = vec![CategoricalVarSpec::new("Group", &["A", "B"], &[0.5, 0.6])];

    let engine = GenerationEngine::default();
    assert!(engine.prepare(&plan).is_err());
    let err = engine.generate(&plan).expect_err("must fail");
    match err {
        GenerationError::Invalid(Error::InvalidProbability { parameter, .. }) => {
            assert_eq!(parameter, "/categorical/0/probabilities");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_psd_matrix_is_rejected() {
    let mut plan = SurveyPlan::new(100);
    plan.variables = vec![
        VariableSpec::new("A", 2),
        VariableSpec::new("B", 2),
        VariableSpec::new("C", 2),
    ];
    plan.latent = Some(LatentModel::CorrelationMatrix {
        matrix: vec![
            vec![1.0, 0.9, -0.9],
            vec![0.9, 1.0, 0.9],
            vec![-0.9, 0.9, 1.0],
        ],
    });

    let err = GenerationEngine::default()
        .generate(&plan)
        .expect_err("must fail");
    assert!(matches!(
        err,
        GenerationError::Invalid(Error::NotPositiveSemiDefinite { .. })
    ));
}

#[test]
fn latent_scores_expose_the_regression() {
    let mut plan = SurveyPlan::new(5_000);
    plan.seed = Some(77);
    plan.emit_latent_scores = true;
    plan.variables = vec![VariableSpec::new("X", 3), VariableSpec::new("Y", 3)];
    plan.latent = Some(LatentModel::CorrelationMatrix {
        matrix: vec![vec![1.0, 0.1], vec![0.1, 1.0]],
    });
    plan.regression = Some(RegressionSpec {
        dependent_variable: "Y".to_string(),
        coefficients: BTreeMap::from([("X".to_string(), 0.9)]),
        noise_std: 0.1,
        intercept: 0.0,
    });

    let engine = GenerationEngine::default();
    let result = engine.generate(&plan).expect("generate with regression");
    let table = &result.table;
    assert_eq!(
        &table.column_names()[6..],
        &["X_score", "Y_score"]
    );
    let x = table.column("X_score").and_then(|c| c.numeric_values()).expect("x");
    let y = table.column("Y_score").and_then(|c| c.numeric_values()).expect("y");
    assert!(pearson(&x, &y) > 0.95);

    plan.regression = None;
    let baseline = engine.generate(&plan).expect("generate without regression");
    let x = baseline.table.column("X_score").and_then(|c| c.numeric_values()).expect("x");
    let y = baseline.table.column("Y_score").and_then(|c| c.numeric_values()).expect("y");
    assert!(pearson(&x, &y) < 0.2);
}

#[test]
fn seven_point_scale_and_continuous_families() {
    let mut plan = SurveyPlan::new(2_000);
    plan.seed = Some(5);
    plan.likert_scale = LikertScale::SEVEN;
    plan.variables = vec![VariableSpec::new("Mood", 2)];
    plan.continuous = vec![
        ContinuousVarSpec {
            name: "Visits".to_string(),
            mean: 4.0,
            std: 2.0,
            rounding: RoundingMode::Integer,
            distribution: Distribution::Poisson,
        },
        ContinuousVarSpec {
            name: "Score".to_string(),
            mean: 50.0,
            std: 10.0,
            rounding: RoundingMode::Float,
            distribution: Distribution::Uniform,
        },
    ];

    let result = GenerationEngine::default()
        .generate(&plan)
        .expect("generate plan");
    let table = &result.table;

    let mood = table.column("Mood_Q1").expect("mood");
    assert!(mood
        .values
        .iter()
        .all(|value| matches!(value, CellValue::Int(v) if (1..=7).contains(v))));

    let visits = table.column("Visits").and_then(|c| c.numeric_values()).expect("visits");
    assert!(visits.iter().all(|value| *value >= 0.0));
    assert!((mean(&visits) - 4.0).abs() < 0.2);

    let half_width = 3_f64.sqrt() * 10.0;
    let score = table.column("Score").and_then(|c| c.numeric_values()).expect("score");
    assert!(score
        .iter()
        .all(|value| *value >= 50.0 - half_width - 0.01 && *value <= 50.0 + half_width + 0.01));
    assert!((mean(&score) - 50.0).abs() < 1.0);
}

#[test]
fn strict_mode_refuses_warnings() {
    let mut plan = alpha_plan(10, 3, 0.7);
    plan.seed = Some(3);

    let relaxed = GenerationEngine::default()
        .generate(&plan)
        .expect("warnings are allowed by default");
    assert_eq!(relaxed.report.warnings_by_code.get("small_sample"), Some(&1));

    let strict = GenerationEngine::new(GenerateOptions { strict: true });
    let err = strict.generate(&plan).expect_err("strict must fail");
    assert!(matches!(err, GenerationError::StrictWarnings(ref codes) if codes.contains("small_sample")));
}

#[test]
fn csv_export_has_header_and_fixed_decimals() {
    let mut plan = SurveyPlan::new(3);
    plan.seed = Some(10);
    plan.continuous = vec![
        ContinuousVarSpec::normal("Age", 30.0, 0.0, RoundingMode::Integer),
        ContinuousVarSpec::normal("Height", 1.7, 0.0, RoundingMode::Decimals(3)),
    ];
    plan.categorical = vec![CategoricalVarSpec::new("City", &["New York, NY"], &[1.0])];

    let result = GenerationEngine::default()
        .generate(&plan)
        .expect("generate plan");
    let csv = table_to_csv_string(&result.table).expect("csv");
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Age,Height,City");
    for line in &lines[1..] {
        assert_eq!(*line, "30,1.700,\"New York, NY\"");
    }
}

#[test]
fn outcome_follows_continuous_regressor() {
    let plan = load_plan("measures.plan.json");
    let result = GenerationEngine::default()
        .generate(&plan)
        .expect("generate measures plan");
    let table = &result.table;

    assert_eq!(table.column_names(), vec!["X1", "Visits", "Y", "Segment"]);
    assert_eq!(
        result
            .report
            .columns_of_kind(ColumnKind::Outcome)
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Y"]
    );

    let x = table.column("X1").and_then(|c| c.numeric_values()).expect("X1");
    let y = table.column("Y").and_then(|c| c.numeric_values()).expect("Y");
    assert!((mean(&y) - 110.0).abs() < 1.5, "mean {}", mean(&y));

    let (mx, my) = (mean(&x), mean(&y));
    let cov: f64 = x.iter().zip(&y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let var: f64 = x.iter().map(|a| (a - mx) * (a - mx)).sum();
    let slope = cov / var;
    assert!((slope - 2.0).abs() < 0.1, "slope {slope}");
}

#[test]
fn noiseless_outcome_is_exact() {
    let mut plan = SurveyPlan::new(200);
    plan.seed = Some(5);
    plan.continuous = vec![ContinuousVarSpec::normal(
        "X1",
        50.0,
        10.0,
        RoundingMode::Decimals(6),
    )];
    plan.outcomes = vec![OutcomeSpec::new(
        "Y",
        10.0,
        &[("X1", 2.0)],
        0.0,
        RoundingMode::Decimals(6),
    )];

    let table = GenerationEngine::default()
        .generate(&plan)
        .expect("generate")
        .table;
    let x = table.column("X1").and_then(|c| c.numeric_values()).expect("X1");
    let y = table.column("Y").and_then(|c| c.numeric_values()).expect("Y");
    for (a, b) in x.iter().zip(&y) {
        assert!((b - (10.0 + 2.0 * a)).abs() < 1e-5, "{b} vs {a}");
    }
}

#[test]
fn quartile_labels_split_rows_evenly() {
    let plan = load_plan("measures.plan.json");
    let table = GenerationEngine::default()
        .generate(&plan)
        .expect("generate measures plan")
        .table;
    let column = table.column("Visits").expect("Visits column");

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in &column.values {
        *counts.entry(value.as_str().expect("label")).or_insert(0) += 1;
    }
    assert_eq!(counts.keys().copied().collect::<Vec<_>>(), ["A", "B", "C", "D"]);
    for (label, count) in counts {
        let share = count as f64 / table.row_count() as f64;
        assert!((0.24..=0.26).contains(&share), "{label}: {share}");
    }
}

#[test]
fn latent_mean_shifts_responses() {
    let mut plan = SurveyPlan::new(5000);
    plan.seed = Some(77);
    plan.emit_latent_scores = true;
    plan.variables = vec![
        VariableSpec::new("Neutral", 2),
        VariableSpec::new("Agree", 2).with_mean(1.0),
    ];

    let table = GenerationEngine::default()
        .generate(&plan)
        .expect("generate")
        .table;
    let numeric = |name: &str| {
        table
            .column(name)
            .and_then(|column| column.numeric_values())
            .unwrap_or_else(|| panic!("missing {name}"))
    };

    assert!(mean(&numeric("Neutral_score")).abs() < 0.05);
    assert!((mean(&numeric("Agree_score")) - 1.0).abs() < 0.05);
    assert!(mean(&numeric("Agree_Q1")) > mean(&numeric("Neutral_Q1")) + 0.5);
}
