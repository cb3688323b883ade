use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single generated cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    /// Already rounded to `decimals`; the value is rendered with exactly that many.
    Float { value: f64, decimals: u32 },
    Text(String),
}

impl CellValue {
    /// Render the value for delimited-text export.
    pub fn to_csv(&self) -> String {
        match self {
            CellValue::Int(value) => value.to_string(),
            CellValue::Float { value, decimals } => {
                let decimals = *decimals as usize;
                format!("{value:.decimals$}")
            }
            CellValue::Text(value) => value.clone(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(value) => Some(*value as f64),
            CellValue::Float { value, .. } => Some(*value),
            CellValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Named column of generated values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric view of the column; `None` when any cell is text.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        self.values.iter().map(CellValue::as_f64).collect()
    }
}

/// Rectangular dataset: ordered, uniquely named, equal-length columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTable {
    row_count: usize,
    columns: Vec<Column>,
}

impl GeneratedTable {
    /// Build a table from columns, rejecting duplicate names and ragged lengths.
    pub fn try_new(row_count: usize, columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::DuplicateColumnName(column.name.clone()));
            }
            if column.len() != row_count {
                return Err(Error::mismatched_length(
                    format!("/columns/{}", column.name),
                    row_count,
                    column.len(),
                ));
            }
        }
        Ok(Self { row_count, columns })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Cells of row `index`, left to right.
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.row_count {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|column| &column.values[index])
                .collect(),
        )
    }
}
