use std::collections::BTreeMap;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use surveyforge_core::{CellValue, Column, CorrelationMatrix, GeneratedTable};
use surveyforge_plan::{
    LatentModel, RoundingMode, SurveyPlan, ValidationIssue, plan_fingerprint, validate_plan,
};

use crate::assemble::TableAssembler;
use crate::categorical::CategoricalSampler;
use crate::discretize::{ContinuousSampler, likert_item, round_column};
use crate::errors::GenerationError;
use crate::model::{ColumnKind, GenerateOptions, GenerationIssue, GenerationReport};
use crate::regression::{OutcomeModel, RegressionModel};
use crate::sampler::{LatentMatrix, LatentSampler};
use crate::solver::alpha_structure;

/// Decimals used for `{variable}_score` columns.
pub const LATENT_SCORE_DECIMALS: u32 = 4;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub table: GeneratedTable,
    pub report: GenerationReport,
}

/// Entry point for generating survey tables from a plan.
#[derive(Debug, Clone, Default)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

/// A plan whose every sampler has been constructed; nothing is drawn yet.
#[derive(Debug, Clone)]
pub struct PreparedPlan {
    plan: SurveyPlan,
    warnings: Vec<ValidationIssue>,
    latent: Option<LatentStage>,
    continuous: Vec<(String, ContinuousSampler)>,
    outcomes: Vec<PreparedOutcome>,
    categorical: Vec<(String, CategoricalSampler)>,
}

#[derive(Debug, Clone)]
struct PreparedOutcome {
    name: String,
    model: OutcomeModel,
    rounding: RoundingMode,
}

impl PreparedPlan {
    pub fn plan(&self) -> &SurveyPlan {
        &self.plan
    }

    pub fn warnings(&self) -> &[ValidationIssue] {
        &self.warnings
    }
}

#[derive(Debug, Clone)]
struct LatentStage {
    sampler: LatentSampler,
    layout: LatentLayout,
    regression: Option<RegressionModel>,
    inter_item_correlations: BTreeMap<String, f64>,
}

/// How latent columns map onto variables.
#[derive(Debug, Clone)]
enum LatentLayout {
    /// One latent column per variable; its items add jitter to that column.
    PerVariable { jitter_std: f64 },
    /// One latent column per item; `offsets[v]` is variable `v`'s first item column.
    PerItem { offsets: Vec<usize> },
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    /// Validate the plan and build every sampler it needs.
    ///
    /// Every configuration error surfaces here, before any value is drawn.
    pub fn prepare(&self, plan: &SurveyPlan) -> Result<PreparedPlan, GenerationError> {
        let validated = validate_plan(plan)?;
        if self.options.strict && !validated.warnings.is_empty() {
            let codes: Vec<&str> = validated
                .warnings
                .iter()
                .map(|issue| issue.code.as_str())
                .collect();
            return Err(GenerationError::StrictWarnings(codes.join(", ")));
        }
        let plan = validated.plan;

        let latent = if plan.variables.is_empty() {
            None
        } else {
            Some(prepare_latent(&plan)?)
        };

        let continuous = plan
            .continuous
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                ContinuousSampler::new(spec, &format!("/continuous/{idx}"))
                    .map(|sampler| (spec.name.clone(), sampler))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let continuous_names: Vec<&str> = plan
            .continuous
            .iter()
            .map(|spec| spec.name.as_str())
            .collect();
        let outcomes = plan
            .outcomes
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                OutcomeModel::resolve(&continuous_names, spec, &format!("/outcomes/{idx}")).map(
                    |model| PreparedOutcome {
                        name: spec.name.clone(),
                        model,
                        rounding: spec.rounding,
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let categorical = plan
            .categorical
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                CategoricalSampler::new(spec, &format!("/categorical/{idx}"))
                    .map(|sampler| (spec.name.clone(), sampler))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PreparedPlan {
            plan,
            warnings: validated.warnings,
            latent,
            continuous,
            outcomes,
            categorical,
        })
    }

    /// Produce one table from a plan.
    pub fn generate(&self, plan: &SurveyPlan) -> Result<GenerationResult, GenerationError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let outcome = self
            .prepare(plan)
            .and_then(|prepared| self.generate_prepared(&prepared, run_id.clone()));
        if let Err(err) = &outcome {
            warn!(run_id = %run_id, error = %err, "generation failed");
        }
        outcome
    }

    /// Draw a table from an already prepared plan.
    pub fn generate_prepared(
        &self,
        prepared: &PreparedPlan,
        run_id: String,
    ) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let plan = &prepared.plan;
        let seed = plan.seed.unwrap_or_else(rand::random);

        let mut report = GenerationReport::new(run_id.clone(), plan_fingerprint(plan)?, seed);
        report.seed_from_plan = plan.seed.is_some();
        report.sample_count = plan.sample_count;
        report.likert_scale = plan.likert_scale.points();
        for issue in &prepared.warnings {
            let issue = GenerationIssue::from(issue);
            warn!(code = %issue.code, message = %issue.message, "plan warning");
            report.record_warning(issue);
        }

        info!(
            run_id = %run_id,
            seed,
            rows = plan.sample_count,
            variables = plan.variables.len(),
            continuous = plan.continuous.len(),
            outcomes = plan.outcomes.len(),
            categorical = plan.categorical.len(),
            "generation started"
        );

        let mut assembler = TableAssembler::new(plan.sample_count);

        if let Some(stage) = &prepared.latent {
            let latent = draw_latent(stage, plan.sample_count, seed)?;
            if let Some(model) = &stage.regression {
                report.dependent_variable =
                    Some(plan.variables[model.dependent_column()].name.clone());
            }
            report.inter_item_correlations = stage.inter_item_correlations.clone();

            let mut scores = Vec::with_capacity(plan.variables.len());
            for (var_idx, variable) in plan.variables.iter().enumerate() {
                for (item_idx, column_name) in variable.item_column_names().into_iter().enumerate()
                {
                    let mut rng = stage_rng(seed, &format!("likert:{column_name}"));
                    let (source, jitter_std) = match &stage.layout {
                        LatentLayout::PerVariable { jitter_std } => {
                            (latent.column(var_idx), *jitter_std)
                        }
                        LatentLayout::PerItem { offsets } => {
                            (latent.column(offsets[var_idx] + item_idx), 0.0)
                        }
                    };
                    let responses = likert_item(&source, jitter_std, plan.likert_scale, &mut rng)?;
                    assembler.push(Column::new(
                        column_name.clone(),
                        responses.into_iter().map(CellValue::Int).collect(),
                    ))?;
                    report.record_column(&column_name, ColumnKind::Likert, &variable.name);
                }
                if plan.emit_latent_scores {
                    scores.push(variable_score(&latent, &stage.layout, var_idx, variable.item_count));
                }
            }
            debug!(
                columns = plan.likert_column_names().len(),
                scale = plan.likert_scale.points(),
                "likert items emitted"
            );

            for (variable, score) in plan.variables.iter().zip(scores) {
                let name = variable.score_column_name();
                assembler.push(Column::new(
                    name.clone(),
                    round_column(&score, RoundingMode::Decimals(LATENT_SCORE_DECIMALS)),
                ))?;
                report.record_column(&name, ColumnKind::LatentScore, &variable.name);
            }
        }

        let mut raw_continuous = Vec::with_capacity(prepared.continuous.len());
        for (name, sampler) in &prepared.continuous {
            let mut rng = stage_rng(seed, &format!("continuous:{name}"));
            let raw = sampler.draw_values(plan.sample_count, &mut rng);
            assembler.push(Column::new(name.clone(), round_column(&raw, sampler.rounding())))?;
            report.record_column(name, ColumnKind::Continuous, name);
            debug!(column = %name, labels = sampler.rounding().is_labels(), "continuous column sampled");
            raw_continuous.push(raw);
        }

        for outcome in &prepared.outcomes {
            let mut rng = stage_rng(seed, &format!("outcome:{}", outcome.name));
            let values = outcome.model.apply(&raw_continuous, &mut rng)?;
            assembler.push(Column::new(
                outcome.name.clone(),
                round_column(&values, outcome.rounding),
            ))?;
            report.record_column(&outcome.name, ColumnKind::Outcome, &outcome.name);
            debug!(column = %outcome.name, "outcome column derived");
        }

        for (name, sampler) in &prepared.categorical {
            let mut rng = stage_rng(seed, &format!("categorical:{name}"));
            let labels = sampler.sample(plan.sample_count, &mut rng);
            assembler.push(Column::new(
                name.clone(),
                labels.into_iter().map(CellValue::Text).collect(),
            ))?;
            report.record_column(name, ColumnKind::Categorical, name);
            debug!(
                column = %name,
                categories = sampler.categories().len(),
                "categorical column sampled"
            );
        }

        let table = assembler.finish()?;
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            run_id = %run_id,
            rows = table.row_count(),
            columns = table.column_count(),
            seed,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult { table, report })
    }
}

fn prepare_latent(plan: &SurveyPlan) -> Result<LatentStage, GenerationError> {
    let names = plan.variable_names();
    let (matrix, layout, inter_item_correlations) = match &plan.latent {
        None => (
            CorrelationMatrix::identity(names.len()),
            LatentLayout::PerVariable {
                jitter_std: plan.item_jitter_std,
            },
            BTreeMap::new(),
        ),
        Some(LatentModel::CorrelationMatrix { matrix }) => (
            CorrelationMatrix::from_rows("/latent/matrix", matrix)?,
            LatentLayout::PerVariable {
                jitter_std: plan.item_jitter_std,
            },
            BTreeMap::new(),
        ),
        Some(LatentModel::TargetAlpha { target_alpha }) => {
            let item_counts: Vec<u32> = plan
                .variables
                .iter()
                .map(|variable| variable.item_count)
                .collect();
            let structure = alpha_structure(*target_alpha, &item_counts)?;
            let mut offsets = Vec::with_capacity(item_counts.len());
            let mut next = 0;
            for count in &item_counts {
                offsets.push(next);
                next += *count as usize;
            }
            let correlations = names
                .iter()
                .map(|name| name.to_string())
                .zip(structure.correlations)
                .collect();
            (
                structure.matrix,
                LatentLayout::PerItem { offsets },
                correlations,
            )
        }
    };

    let regression = plan
        .regression
        .as_ref()
        .map(|spec| RegressionModel::resolve(&names, spec))
        .transpose()?;

    let means = match &layout {
        LatentLayout::PerVariable { .. } => plan
            .variables
            .iter()
            .map(|variable| variable.mean)
            .collect(),
        LatentLayout::PerItem { .. } => plan
            .variables
            .iter()
            .flat_map(|variable| std::iter::repeat_n(variable.mean, variable.item_count as usize))
            .collect(),
    };

    Ok(LatentStage {
        sampler: LatentSampler::with_mean(means, &matrix)?,
        layout,
        regression,
        inter_item_correlations,
    })
}

fn draw_latent(
    stage: &LatentStage,
    sample_count: usize,
    seed: u64,
) -> Result<LatentMatrix, GenerationError> {
    let mut rng = stage_rng(seed, "latent");
    let latent = stage.sampler.sample(sample_count, &mut rng);
    debug!(dimensions = stage.sampler.dim(), rows = sample_count, "latent scores sampled");

    match &stage.regression {
        Some(model) => {
            let mut rng = stage_rng(seed, "regression");
            let derived = model.apply(&latent, &mut rng)?;
            debug!(dependent = model.dependent_column(), "regression outcome derived");
            Ok(derived)
        }
        None => Ok(latent),
    }
}

fn variable_score(
    latent: &LatentMatrix,
    layout: &LatentLayout,
    var_idx: usize,
    item_count: u32,
) -> Vec<f64> {
    match layout {
        LatentLayout::PerVariable { .. } => latent.column(var_idx),
        LatentLayout::PerItem { offsets } => {
            let first = offsets[var_idx];
            let count = item_count as usize;
            (0..latent.rows())
                .map(|row| {
                    let items = &latent.row(row)[first..first + count];
                    items.iter().sum::<f64>() / count as f64
                })
                .collect()
        }
    }
}

fn stage_rng(seed: u64, key: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(hash_seed(seed, key))
}

/// Mix a run seed with a stage key so every stage draws from its own stream.
pub fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_seeds_differ_by_key() {
        assert_ne!(hash_seed(42, "latent"), hash_seed(42, "regression"));
        assert_ne!(hash_seed(42, "latent"), hash_seed(43, "latent"));
        assert_eq!(hash_seed(7, "likert:Trust_Q1"), hash_seed(7, "likert:Trust_Q1"));
    }
}
