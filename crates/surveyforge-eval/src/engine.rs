use std::collections::BTreeMap;
use std::time::Instant;

use tracing::info;

use surveyforge_core::GeneratedTable;
use surveyforge_generate::GenerationReport;
use surveyforge_plan::{
    LatentModel, QUARTILE_LABELS, RoundingMode, SurveyPlan, plan_fingerprint,
};

use crate::dataset::LoadedTable;
use crate::errors::EvalError;
use crate::metrics::{
    CategoricalMetrics, CategoryFrequency, ContinuousMetrics, METRICS_VERSION, MetricsPlanRef,
    MetricsReport, PerformanceMetrics, ScaleMetrics, ScoreCorrelation, WarningItem,
};
use crate::model::{Deviation, EvaluateOptions, EvaluationResult};
use crate::report::render_report;
use crate::stats::{
    cronbach_alpha, mean, mean_inter_item_correlation, pearson, scale_scores, std_dev,
};

/// Compare a generated table against the plan that produced it.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine {
    options: EvaluateOptions,
}

impl EvaluationEngine {
    pub fn new(options: EvaluateOptions) -> Self {
        Self { options }
    }

    /// Evaluate a table read back from CSV, carrying its load warnings.
    pub fn evaluate_loaded(
        &self,
        plan: &SurveyPlan,
        loaded: &LoadedTable,
        generation: Option<&GenerationReport>,
    ) -> Result<EvaluationResult, EvalError> {
        self.evaluate_inner(plan, &loaded.table, generation, loaded.warnings.clone())
    }

    pub fn evaluate(
        &self,
        plan: &SurveyPlan,
        table: &GeneratedTable,
        generation: Option<&GenerationReport>,
    ) -> Result<EvaluationResult, EvalError> {
        self.evaluate_inner(plan, table, generation, Vec::new())
    }

    fn evaluate_inner(
        &self,
        plan: &SurveyPlan,
        table: &GeneratedTable,
        generation: Option<&GenerationReport>,
        mut warnings: Vec<WarningItem>,
    ) -> Result<EvaluationResult, EvalError> {
        let start = Instant::now();
        let mut deviations = Vec::new();

        let rows_found = table.row_count() as u64;
        let rows_expected = plan.sample_count as u64;
        if rows_found != rows_expected {
            deviations.push(Deviation {
                code: "row_count_mismatch".to_string(),
                path: "/sample_count".to_string(),
                message: format!("found {rows_found} rows, expected {rows_expected}"),
                observed: rows_found as f64,
                expected: rows_expected as f64,
            });
        }

        let (scales, scores) = self.evaluate_scales(plan, table, &mut warnings, &mut deviations);
        let score_correlations = score_correlations(plan, &scores);

        let mut continuous = Vec::new();
        let mut categorical = Vec::new();
        let quartile_shares = [0.25; 4];
        let quartile_labels = QUARTILE_LABELS.map(String::from);
        for (idx, spec) in plan.continuous.iter().enumerate() {
            let path = format!("/continuous/{idx}");
            if spec.rounding.is_labels() {
                categorical.extend(self.evaluate_frequencies(
                    &spec.name,
                    &path,
                    &quartile_labels,
                    &quartile_shares,
                    table,
                    &mut warnings,
                    &mut deviations,
                ));
            } else {
                continuous.extend(self.evaluate_numeric(
                    NumericTarget {
                        name: &spec.name,
                        path,
                        mean: spec.mean,
                        std: spec.target_std(),
                        rounding: spec.rounding,
                    },
                    table,
                    &mut warnings,
                    &mut deviations,
                ));
            }
        }
        for (idx, spec) in plan.outcomes.iter().enumerate() {
            let (mean, std) = spec.expected_moments(&plan.continuous);
            continuous.extend(self.evaluate_numeric(
                NumericTarget {
                    name: &spec.name,
                    path: format!("/outcomes/{idx}"),
                    mean,
                    std,
                    rounding: spec.rounding,
                },
                table,
                &mut warnings,
                &mut deviations,
            ));
        }
        for (idx, spec) in plan.categorical.iter().enumerate() {
            categorical.extend(self.evaluate_frequencies(
                &spec.name,
                &format!("/categorical/{idx}"),
                &spec.categories,
                &spec.probabilities,
                table,
                &mut warnings,
                &mut deviations,
            ));
        }

        sort_warnings(&mut warnings);
        sort_deviations(&mut deviations);

        let run_id = generation
            .map(|report| report.run_id.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let seed = generation.map(|report| report.seed).or(plan.seed);

        let metrics = MetricsReport {
            metrics_version: METRICS_VERSION.to_string(),
            run_id: run_id.clone(),
            plan_ref: MetricsPlanRef {
                plan_version: plan.plan_version.clone(),
                seed,
                plan_fingerprint: plan_fingerprint(plan)?,
            },
            rows_found,
            rows_expected,
            scales,
            score_correlations,
            continuous,
            categorical,
            warnings,
            performance: PerformanceMetrics {
                evaluate_ms: start.elapsed().as_millis(),
            },
        };

        let report = render_report(&metrics, &deviations, self.options.max_examples);

        info!(
            run_id = %run_id,
            rows = rows_found,
            deviations = deviations.len(),
            "evaluation completed"
        );

        if self.options.strict && !deviations.is_empty() {
            return Err(EvalError::Deviations(deviations.len() as u64));
        }

        Ok(EvaluationResult {
            metrics,
            report,
            deviations,
        })
    }

    fn evaluate_scales(
        &self,
        plan: &SurveyPlan,
        table: &GeneratedTable,
        warnings: &mut Vec<WarningItem>,
        deviations: &mut Vec<Deviation>,
    ) -> (Vec<ScaleMetrics>, BTreeMap<usize, Vec<f64>>) {
        let target_alpha = match plan.latent {
            Some(LatentModel::TargetAlpha { target_alpha }) => Some(target_alpha),
            _ => None,
        };

        let mut scales = Vec::new();
        let mut scores = BTreeMap::new();
        for (var_idx, variable) in plan.variables.iter().enumerate() {
            let path = format!("/variables/{var_idx}");
            let items: Option<Vec<Vec<f64>>> = variable
                .item_column_names()
                .iter()
                .map(|name| table.column(name).and_then(|column| column.numeric_values()))
                .collect();
            let Some(items) = items else {
                warnings.push(WarningItem {
                    code: "scale_not_evaluated".to_string(),
                    path,
                    message: format!(
                        "items of '{}' are missing or not numeric",
                        variable.name
                    ),
                    hint: None,
                });
                continue;
            };

            let alpha = cronbach_alpha(&items);
            if let (Some(observed), Some(expected)) = (alpha, target_alpha) {
                if (observed - expected).abs() > self.options.alpha_tolerance {
                    deviations.push(Deviation {
                        code: "alpha_out_of_tolerance".to_string(),
                        path: path.clone(),
                        message: format!(
                            "'{}' alpha {observed:.3} vs target {expected:.3}",
                            variable.name
                        ),
                        observed,
                        expected,
                    });
                }
            }

            scales.push(ScaleMetrics {
                variable: variable.name.clone(),
                items: variable.item_count,
                cronbach_alpha: alpha,
                mean_inter_item_correlation: mean_inter_item_correlation(&items),
                target_alpha,
            });
            scores.insert(var_idx, scale_scores(&items));
        }
        (scales, scores)
    }

    fn evaluate_numeric(
        &self,
        target: NumericTarget<'_>,
        table: &GeneratedTable,
        warnings: &mut Vec<WarningItem>,
        deviations: &mut Vec<Deviation>,
    ) -> Option<ContinuousMetrics> {
        let NumericTarget {
            name,
            path,
            mean: target_mean,
            std: target_std,
            rounding,
        } = target;
        let Some(values) = table.column(name).and_then(|column| column.numeric_values()) else {
            warnings.push(missing_column_warning(name, path));
            return None;
        };

        let observed_mean = mean(&values);
        if let Some(observed) = observed_mean {
            let tolerance =
                self.options.mean_tolerance_sd * target_std + rounding_half_step(rounding);
            if (observed - target_mean).abs() > tolerance {
                deviations.push(Deviation {
                    code: "mean_out_of_tolerance".to_string(),
                    path: format!("{path}/mean"),
                    message: format!(
                        "'{name}' mean {observed:.3} vs target {target_mean:.3}"
                    ),
                    observed,
                    expected: target_mean,
                });
            }
        }

        Some(ContinuousMetrics {
            name: name.to_string(),
            mean: observed_mean,
            std: std_dev(&values),
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
            target_mean,
            target_std,
        })
    }

    /// Observed label shares against expected ones, for categorical and
    /// quartile-labelled columns alike.
    #[allow(clippy::too_many_arguments)]
    fn evaluate_frequencies(
        &self,
        name: &str,
        path: &str,
        categories: &[String],
        probabilities: &[f64],
        table: &GeneratedTable,
        warnings: &mut Vec<WarningItem>,
        deviations: &mut Vec<Deviation>,
    ) -> Option<CategoricalMetrics> {
        let Some(column) = table.column(name) else {
            warnings.push(missing_column_warning(name, path.to_string()));
            return None;
        };

        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for value in &column.values {
            let label = value.as_str().unwrap_or_default();
            *counts.entry(label).or_insert(0) += 1;
        }
        let total = column.len().max(1) as f64;

        let mut frequencies = Vec::with_capacity(categories.len());
        for (category, expected) in categories.iter().zip(probabilities) {
            let count = counts.remove(category.as_str()).unwrap_or(0);
            let observed = count as f64 / total;
            if (observed - expected).abs() > self.options.frequency_tolerance {
                deviations.push(Deviation {
                    code: "frequency_out_of_tolerance".to_string(),
                    path: format!("{path}/probabilities"),
                    message: format!(
                        "'{name}' = '{category}' share {observed:.3} vs expected {expected:.3}"
                    ),
                    observed,
                    expected: *expected,
                });
            }
            frequencies.push(CategoryFrequency {
                category: category.clone(),
                count,
                observed,
                expected: *expected,
            });
        }

        if !counts.is_empty() {
            let labels: Vec<&str> = counts.keys().copied().collect();
            warnings.push(WarningItem {
                code: "unexpected_category".to_string(),
                path: path.to_string(),
                message: format!(
                    "'{name}' contains undeclared labels: {}",
                    labels.join(", ")
                ),
                hint: None,
            });
        }

        Some(CategoricalMetrics {
            name: name.to_string(),
            frequencies,
        })
    }
}

fn score_correlations(
    plan: &SurveyPlan,
    scores: &BTreeMap<usize, Vec<f64>>,
) -> Vec<ScoreCorrelation> {
    let matrix = match &plan.latent {
        Some(LatentModel::CorrelationMatrix { matrix }) => Some(matrix),
        _ => None,
    };
    let dependent = plan
        .regression
        .as_ref()
        .map(|regression| regression.dependent_variable.as_str());
    let mut correlations = Vec::new();
    for (&i, left) in scores {
        for (&j, right) in scores.range(i + 1..) {
            let left_name = plan.variables[i].name.as_str();
            let right_name = plan.variables[j].name.as_str();
            // The regression overwrites the dependent trait, so the matrix
            // entry no longer describes it.
            let regressed = dependent.is_some_and(|name| name == left_name || name == right_name);
            let latent_target = if regressed {
                None
            } else {
                matrix.and_then(|rows| rows.get(i)?.get(j).copied())
            };
            correlations.push(ScoreCorrelation {
                left: left_name.to_string(),
                right: right_name.to_string(),
                observed: pearson(left, right),
                latent_target,
            });
        }
    }
    correlations
}

struct NumericTarget<'a> {
    name: &'a str,
    path: String,
    mean: f64,
    std: f64,
    rounding: RoundingMode,
}

fn rounding_half_step(rounding: RoundingMode) -> f64 {
    match rounding.decimals() {
        None => 0.5,
        Some(decimals) => 0.5 * 10_f64.powi(-(decimals as i32)),
    }
}

fn missing_column_warning(name: &str, path: String) -> WarningItem {
    WarningItem {
        code: "missing_column".to_string(),
        path,
        message: format!("column '{name}' is missing or not numeric"),
        hint: Some("regenerate the dataset from the same plan".to_string()),
    }
}

fn sort_warnings(warnings: &mut [WarningItem]) {
    warnings.sort_by(|a, b| (&a.code, &a.path).cmp(&(&b.code, &b.path)));
}

fn sort_deviations(deviations: &mut [Deviation]) {
    deviations.sort_by(|a, b| (&a.code, &a.path).cmp(&(&b.code, &b.path)));
}
