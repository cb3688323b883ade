use surveyforge_plan::plan_json_schema;

#[test]
fn json_schema_describes_the_plan_contract() {
    let schema = serde_json::to_value(plan_json_schema()).expect("serialize plan json schema");

    assert_eq!(schema["title"], "SurveyPlan");
    assert_eq!(
        schema["required"],
        serde_json::json!(["plan_version", "sample_count"])
    );

    let properties = schema["properties"]
        .as_object()
        .expect("plan properties");
    for field in [
        "plan_version",
        "seed",
        "sample_count",
        "likert_scale",
        "item_jitter_std",
        "emit_latent_scores",
        "variables",
        "latent",
        "regression",
        "continuous",
        "outcomes",
        "categorical",
    ] {
        assert!(properties.contains_key(field), "missing property {field}");
    }
    assert_eq!(properties.len(), 12);

    let definitions = schema["definitions"]
        .as_object()
        .expect("plan definitions");
    for name in [
        "VariableSpec",
        "LatentModel",
        "RegressionSpec",
        "ContinuousVarSpec",
        "OutcomeSpec",
        "CategoricalVarSpec",
        "RoundingMode",
        "Distribution",
    ] {
        assert!(definitions.contains_key(name), "missing definition {name}");
    }
}

#[test]
fn quartile_labels_are_a_rounding_mode() {
    let schema = serde_json::to_value(plan_json_schema()).expect("serialize plan json schema");
    let rounding = serde_json::to_string(&schema["definitions"]["RoundingMode"])
        .expect("serialize rounding schema");
    assert!(rounding.contains("quartile_labels"));
}
