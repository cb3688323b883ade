use serde::Serialize;

use crate::error::{Error, Result};

/// Absolute tolerance for symmetry and unit-diagonal checks.
pub const STRUCTURE_TOLERANCE: f64 = 1e-9;
/// Eigenvalues above `-PSD_TOLERANCE` count as non-negative.
pub const PSD_TOLERANCE: f64 = 1e-9;

const MAX_JACOBI_SWEEPS: usize = 100;

/// Validated correlation matrix, stored row-major.
///
/// Invariants: square, symmetric, unit diagonal, entries in `[-1, 1]`,
/// positive semi-definite. Every constructor enforces all of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    dim: usize,
    values: Vec<f64>,
}

/// Eigen-decomposition of a symmetric matrix.
///
/// `vectors` is row-major; column `j` holds the eigenvector of `values[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricEigen {
    pub dim: usize,
    pub values: Vec<f64>,
    pub vectors: Vec<f64>,
}

impl CorrelationMatrix {
    /// Build from nested rows, checking every structural invariant.
    ///
    /// `parameter` names the configuration field in error messages.
    pub fn from_rows(parameter: &str, rows: &[Vec<f64>]) -> Result<Self> {
        let dim = rows.len();
        let mut values = Vec::with_capacity(dim * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::mismatched_length(
                    format!("{parameter}/{i}"),
                    dim,
                    row.len(),
                ));
            }
            values.extend_from_slice(row);
        }

        for i in 0..dim {
            for j in 0..dim {
                let value = values[i * dim + j];
                let at = format!("{parameter}/{i}/{j}");
                if !value.is_finite() {
                    return Err(Error::invalid_parameter(at, "entry must be finite"));
                }
                if i == j {
                    if (value - 1.0).abs() > STRUCTURE_TOLERANCE {
                        return Err(Error::invalid_parameter(
                            at,
                            format!("diagonal entry must be 1, found {value}"),
                        ));
                    }
                } else {
                    if !(-1.0..=1.0).contains(&value) {
                        return Err(Error::invalid_parameter(
                            at,
                            format!("correlation must lie in [-1, 1], found {value}"),
                        ));
                    }
                    if (value - values[j * dim + i]).abs() > STRUCTURE_TOLERANCE {
                        return Err(Error::invalid_parameter(
                            at,
                            format!(
                                "matrix must be symmetric ({value} vs {})",
                                values[j * dim + i]
                            ),
                        ));
                    }
                }
            }
        }

        let matrix = Self { dim, values };
        matrix.ensure_positive_semi_definite(parameter)?;
        Ok(matrix)
    }

    /// Identity matrix: mutually independent latent variables.
    pub fn identity(dim: usize) -> Self {
        let mut values = vec![0.0; dim * dim];
        for i in 0..dim {
            values[i * dim + i] = 1.0;
        }
        Self { dim, values }
    }

    /// Matrix with 1 on the diagonal and `r` everywhere else.
    ///
    /// Positive semi-definite only for `r >= -1 / (dim - 1)`; checked here
    /// rather than assumed.
    pub fn uniform(parameter: &str, dim: usize, r: f64) -> Result<Self> {
        if !r.is_finite() || !(-1.0..=1.0).contains(&r) {
            return Err(Error::invalid_parameter(
                parameter,
                format!("correlation must lie in [-1, 1], found {r}"),
            ));
        }
        let mut values = vec![r; dim * dim];
        for i in 0..dim {
            values[i * dim + i] = 1.0;
        }
        let matrix = Self { dim, values };
        matrix.ensure_positive_semi_definite(parameter)?;
        Ok(matrix)
    }

    /// Block-diagonal composition; blocks are uncorrelated with each other.
    pub fn block_diagonal(blocks: &[CorrelationMatrix]) -> Self {
        let dim = blocks.iter().map(|block| block.dim).sum();
        let mut values = vec![0.0; dim * dim];
        let mut offset = 0;
        for block in blocks {
            for i in 0..block.dim {
                for j in 0..block.dim {
                    values[(offset + i) * dim + offset + j] = block.get(i, j);
                }
            }
            offset += block.dim;
        }
        Self { dim, values }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.dim + col]
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values
            .chunks(self.dim.max(1))
            .take(self.dim)
            .map(|row| row.to_vec())
            .collect()
    }

    pub fn eigen(&self) -> SymmetricEigen {
        symmetric_eigen(&self.values, self.dim)
    }

    /// Smallest eigenvalue; `1.0` for the empty matrix.
    pub fn min_eigenvalue(&self) -> f64 {
        self.eigen()
            .values
            .into_iter()
            .fold(f64::INFINITY, f64::min)
            .min(1.0)
    }

    /// Row-major factor `F = V * diag(sqrt(max(lambda, 0)))` with `F * F^T`
    /// equal to the matrix. Clamps eigenvalues inside the tolerance band.
    pub fn sampling_factor(&self) -> Vec<f64> {
        let eigen = self.eigen();
        let dim = self.dim;
        let mut factor = vec![0.0; dim * dim];
        for row in 0..dim {
            for col in 0..dim {
                let scale = eigen.values[col].max(0.0).sqrt();
                factor[row * dim + col] = eigen.vectors[row * dim + col] * scale;
            }
        }
        factor
    }

    fn ensure_positive_semi_definite(&self, parameter: &str) -> Result<()> {
        let min_eigenvalue = self.min_eigenvalue();
        if min_eigenvalue < -PSD_TOLERANCE {
            return Err(Error::NotPositiveSemiDefinite {
                parameter: parameter.to_string(),
                min_eigenvalue,
            });
        }
        Ok(())
    }
}

/// Cyclic Jacobi eigen-decomposition of a row-major symmetric matrix.
pub fn symmetric_eigen(matrix: &[f64], dim: usize) -> SymmetricEigen {
    let mut a = matrix.to_vec();
    let mut v = vec![0.0; dim * dim];
    for i in 0..dim {
        v[i * dim + i] = 1.0;
    }

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut off_diagonal = 0.0;
        for p in 0..dim {
            for q in (p + 1)..dim {
                off_diagonal += a[p * dim + q] * a[p * dim + q];
            }
        }
        if off_diagonal < 1e-24 {
            break;
        }

        for p in 0..dim {
            for q in (p + 1)..dim {
                let apq = a[p * dim + q];
                if apq.abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let app = a[p * dim + p];
                let aqq = a[q * dim + q];
                let theta = (aqq - app) / (2.0 * apq);
                let t = if theta >= 0.0 {
                    1.0 / (theta + (theta * theta + 1.0).sqrt())
                } else {
                    -1.0 / (-theta + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..dim {
                    let akp = a[k * dim + p];
                    let akq = a[k * dim + q];
                    a[k * dim + p] = c * akp - s * akq;
                    a[k * dim + q] = s * akp + c * akq;
                }
                for k in 0..dim {
                    let apk = a[p * dim + k];
                    let aqk = a[q * dim + k];
                    a[p * dim + k] = c * apk - s * aqk;
                    a[q * dim + k] = s * apk + c * aqk;
                }
                for k in 0..dim {
                    let vkp = v[k * dim + p];
                    let vkq = v[k * dim + q];
                    v[k * dim + p] = c * vkp - s * vkq;
                    v[k * dim + q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = (0..dim).map(|i| a[i * dim + i]).collect();
    SymmetricEigen {
        dim,
        values,
        vectors: v,
    }
}
