use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use surveyforge_core::{CellValue, Column, GeneratedTable};
use surveyforge_generate::LATENT_SCORE_DECIMALS;
use surveyforge_plan::{RoundingMode, SurveyPlan};

use crate::errors::EvalError;
use crate::metrics::WarningItem;

/// A table read back from CSV plus load-time warnings.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: GeneratedTable,
    pub warnings: Vec<WarningItem>,
}

#[derive(Debug, Clone, Copy)]
enum CellKind {
    Int,
    Float(u32),
    Text,
}

/// Read a CSV with a header row, typing each column by what the plan says it holds.
///
/// Columns the plan does not know are kept as text and reported.
pub fn read_table_csv<R: Read>(reader: R, plan: &SurveyPlan) -> Result<LoadedTable, EvalError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.to_string())
        .collect::<Vec<_>>();

    let kinds = column_kinds(plan);
    let mut warnings = Vec::new();

    let missing: Vec<String> = plan
        .column_names()
        .into_iter()
        .filter(|name| !headers.contains(name))
        .collect();
    if !missing.is_empty() {
        warnings.push(WarningItem {
            code: "missing_columns".to_string(),
            path: "/".to_string(),
            message: format!("missing columns: {}", missing.join(", ")),
            hint: Some("regenerate the dataset from the same plan".to_string()),
        });
    }

    let extra: Vec<&str> = headers
        .iter()
        .filter(|header| !kinds.contains_key(header.as_str()))
        .map(String::as_str)
        .collect();
    if !extra.is_empty() {
        warnings.push(WarningItem {
            code: "extra_columns".to_string(),
            path: "/".to_string(),
            message: format!("unexpected columns: {}", extra.join(", ")),
            hint: Some("check that the dataset was produced by this plan".to_string()),
        });
    }

    let column_kinds: Vec<CellKind> = headers
        .iter()
        .map(|header| kinds.get(header).copied().unwrap_or(CellKind::Text))
        .collect();
    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];

    let mut rows = 0_usize;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(EvalError::InvalidDataset(format!(
                "row {} has {} fields, expected {}",
                row_idx + 1,
                record.len(),
                headers.len()
            )));
        }
        for (col_idx, raw) in record.iter().enumerate() {
            let cell = parse_cell(column_kinds[col_idx], raw).ok_or_else(|| {
                EvalError::InvalidDataset(format!(
                    "invalid value '{raw}' in column '{}' row {}",
                    headers[col_idx],
                    row_idx + 1
                ))
            })?;
            values[col_idx].push(cell);
        }
        rows += 1;
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    let table = GeneratedTable::try_new(rows, columns)?;

    Ok(LoadedTable { table, warnings })
}

pub fn read_table_csv_file(path: &Path, plan: &SurveyPlan) -> Result<LoadedTable, EvalError> {
    let file = std::fs::File::open(path)?;
    read_table_csv(std::io::BufReader::new(file), plan)
}

fn column_kinds(plan: &SurveyPlan) -> HashMap<String, CellKind> {
    let mut kinds = HashMap::new();
    for name in plan.likert_column_names() {
        kinds.insert(name, CellKind::Int);
    }
    if plan.emit_latent_scores {
        for variable in &plan.variables {
            kinds.insert(
                variable.score_column_name(),
                CellKind::Float(LATENT_SCORE_DECIMALS),
            );
        }
    }
    for spec in &plan.continuous {
        kinds.insert(spec.name.clone(), rounding_kind(spec.rounding));
    }
    for spec in &plan.outcomes {
        kinds.insert(spec.name.clone(), rounding_kind(spec.rounding));
    }
    for spec in &plan.categorical {
        kinds.insert(spec.name.clone(), CellKind::Text);
    }
    kinds
}

fn rounding_kind(rounding: RoundingMode) -> CellKind {
    match rounding {
        RoundingMode::QuartileLabels => CellKind::Text,
        RoundingMode::Integer => CellKind::Int,
        other => CellKind::Float(other.decimals().unwrap_or(2)),
    }
}

fn parse_cell(kind: CellKind, raw: &str) -> Option<CellValue> {
    match kind {
        CellKind::Int => raw.trim().parse().ok().map(CellValue::Int),
        CellKind::Float(decimals) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| CellValue::Float { value, decimals }),
        CellKind::Text => Some(CellValue::Text(raw.to_string())),
    }
}
