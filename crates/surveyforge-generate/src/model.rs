use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use surveyforge_plan::ValidationIssue;

/// Options for the generation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Refuse plans that validate with warnings.
    pub strict: bool,
}

/// What produced a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Likert,
    LatentScore,
    Continuous,
    Outcome,
    Categorical,
}

/// Summary of one emitted column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReport {
    pub name: String,
    pub kind: ColumnKind,
    /// Variable or spec name the column was derived from.
    pub source: String,
}

/// Structured generation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    pub path: Option<String>,
}

impl From<&ValidationIssue> for GenerationIssue {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            level: issue.severity.as_str().to_string(),
            code: issue.code.clone(),
            message: issue.message.clone(),
            path: Some(issue.path.clone()),
        }
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    /// SHA-256 of the canonical plan JSON.
    pub plan_fingerprint: String,
    /// Seed actually used; replaying the plan with it reproduces the table.
    pub seed: u64,
    pub seed_from_plan: bool,
    pub sample_count: usize,
    pub likert_scale: u8,
    pub columns: Vec<ColumnReport>,
    /// Solved inter-item correlation per variable (target-alpha plans only).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inter_item_correlations: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_variable: Option<String>,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<GenerationIssue>,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, plan_fingerprint: String, seed: u64) -> Self {
        Self {
            run_id,
            plan_fingerprint,
            seed,
            seed_from_plan: false,
            sample_count: 0,
            likert_scale: 0,
            columns: Vec::new(),
            inter_item_correlations: BTreeMap::new(),
            dependent_variable: None,
            warnings_by_code: BTreeMap::new(),
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn record_column(&mut self, name: &str, kind: ColumnKind, source: &str) {
        self.columns.push(ColumnReport {
            name: name.to_string(),
            kind,
            source: source.to_string(),
        });
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }

    pub fn columns_of_kind(&self, kind: ColumnKind) -> impl Iterator<Item = &ColumnReport> {
        self.columns.iter().filter(move |column| column.kind == kind)
    }
}
