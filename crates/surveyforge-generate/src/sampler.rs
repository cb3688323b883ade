use rand::Rng;
use rand_distr::StandardNormal;

use surveyforge_core::{CorrelationMatrix, Error, Result};

/// Row-major `rows x cols` matrix of latent scores.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl LatentMatrix {
    /// Build from equal-length columns.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let cols = columns.len();
        let rows = columns.first().map(Vec::len).unwrap_or(0);
        for (idx, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(Error::mismatched_length(
                    format!("latent/{idx}"),
                    rows,
                    column.len(),
                ));
            }
        }
        let mut values = vec![0.0; rows * cols];
        for (col, column) in columns.iter().enumerate() {
            for (row, value) in column.iter().enumerate() {
                values[row * cols + col] = *value;
            }
        }
        Ok(Self { rows, cols, values })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|row| self.get(row, col)).collect()
    }

    /// Copy of the matrix with column `col` replaced.
    pub fn with_column(&self, col: usize, column: &[f64]) -> Result<Self> {
        if column.len() != self.rows {
            return Err(Error::mismatched_length(
                format!("latent/{col}"),
                self.rows,
                column.len(),
            ));
        }
        let mut values = self.values.clone();
        for (row, value) in column.iter().enumerate() {
            values[row * self.cols + col] = *value;
        }
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            values,
        })
    }
}

/// Multivariate normal sampler over a validated correlation matrix.
///
/// The matrix type already guarantees positive semi-definiteness, so the
/// factorization cannot fail once a sampler exists.
#[derive(Debug, Clone)]
pub struct LatentSampler {
    dim: usize,
    mean: Vec<f64>,
    factor: Vec<f64>,
}

impl LatentSampler {
    /// Zero-mean sampler.
    pub fn new(matrix: &CorrelationMatrix) -> Self {
        Self {
            dim: matrix.dim(),
            mean: vec![0.0; matrix.dim()],
            factor: matrix.sampling_factor(),
        }
    }

    pub fn with_mean(mean: Vec<f64>, matrix: &CorrelationMatrix) -> Result<Self> {
        if mean.len() != matrix.dim() {
            return Err(Error::mismatched_length("mean", matrix.dim(), mean.len()));
        }
        if let Some(idx) = mean.iter().position(|value| !value.is_finite()) {
            return Err(Error::invalid_parameter(
                format!("mean/{idx}"),
                "must be finite",
            ));
        }
        Ok(Self {
            mean,
            ..Self::new(matrix)
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Draw `sample_count` rows of `mean + F z` with `z ~ N(0, I)`.
    pub fn sample<R: Rng + ?Sized>(&self, sample_count: usize, rng: &mut R) -> LatentMatrix {
        let dim = self.dim;
        let mut values = Vec::with_capacity(sample_count * dim);
        let mut z = vec![0.0; dim];
        for _ in 0..sample_count {
            for slot in z.iter_mut() {
                *slot = rng.sample(StandardNormal);
            }
            for row in 0..dim {
                let mut value = self.mean[row];
                for (col, z_value) in z.iter().enumerate() {
                    value += self.factor[row * dim + col] * z_value;
                }
                values.push(value);
            }
        }
        LatentMatrix {
            rows: sample_count,
            cols: dim,
            values,
        }
    }
}
