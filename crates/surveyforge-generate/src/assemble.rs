use std::collections::HashSet;

use surveyforge_core::{Column, Error, GeneratedTable, Result};

/// Joins generator outputs left to right into one table.
#[derive(Debug)]
pub struct TableAssembler {
    sample_count: usize,
    names: HashSet<String>,
    columns: Vec<Column>,
}

impl TableAssembler {
    pub fn new(sample_count: usize) -> Self {
        Self {
            sample_count,
            names: HashSet::new(),
            columns: Vec::new(),
        }
    }

    /// Append a column; names must be unique and lengths equal `sample_count`.
    pub fn push(&mut self, column: Column) -> Result<()> {
        if self.names.contains(&column.name) {
            return Err(Error::DuplicateColumnName(column.name));
        }
        if column.len() != self.sample_count {
            return Err(Error::mismatched_length(
                format!("/columns/{}", column.name),
                self.sample_count,
                column.len(),
            ));
        }
        self.names.insert(column.name.clone());
        self.columns.push(column);
        Ok(())
    }

    pub fn extend(&mut self, columns: impl IntoIterator<Item = Column>) -> Result<()> {
        for column in columns {
            self.push(column)?;
        }
        Ok(())
    }

    pub fn finish(self) -> Result<GeneratedTable> {
        GeneratedTable::try_new(self.sample_count, self.columns)
    }
}
