use rand::Rng;
use rand_distr::{Distribution, Normal};

use surveyforge_core::{Error, Result};
use surveyforge_plan::{OutcomeSpec, RegressionSpec};

use crate::sampler::LatentMatrix;

/// Regression spec resolved against latent column positions.
#[derive(Debug, Clone)]
pub struct RegressionModel {
    dependent: usize,
    /// `(column, beta)` in latent column order.
    regressors: Vec<(usize, f64)>,
    intercept: f64,
    noise: Normal<f64>,
}

impl RegressionModel {
    /// Resolve coefficient names to the columns of a latent matrix laid out in
    /// `names` order.
    pub fn resolve(names: &[&str], spec: &RegressionSpec) -> Result<Self> {
        spec.validate(names)?;

        let dependent = names
            .iter()
            .position(|name| *name == spec.dependent_variable)
            .ok_or_else(|| {
                Error::invalid_parameter(
                    "/regression/dependent_variable",
                    format!("'{}' is not a latent column", spec.dependent_variable),
                )
            })?;

        let regressors = names
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != dependent)
            .filter_map(|(idx, name)| spec.coefficients.get(*name).map(|beta| (idx, *beta)))
            .collect();

        let noise = Normal::new(0.0, spec.noise_std).map_err(|err| {
            Error::invalid_parameter("/regression/noise_std", err.to_string())
        })?;

        Ok(Self {
            dependent,
            regressors,
            intercept: spec.intercept,
            noise,
        })
    }

    pub fn dependent_column(&self) -> usize {
        self.dependent
    }

    /// Noise-free linear predictor for one latent row.
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.regressors
            .iter()
            .fold(self.intercept, |acc, (col, beta)| acc + beta * row[*col])
    }

    /// New matrix whose dependent column is the linear predictor plus noise.
    ///
    /// Must run on already-correlated latents: the regressors keep their
    /// sampled values and only the dependent column is overwritten.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        latent: &LatentMatrix,
        rng: &mut R,
    ) -> Result<LatentMatrix> {
        if self.dependent >= latent.cols()
            || self.regressors.iter().any(|(col, _)| *col >= latent.cols())
        {
            return Err(Error::invalid_parameter(
                "/regression",
                format!("model refers to columns beyond the {} latent columns", latent.cols()),
            ));
        }
        let outcome: Vec<f64> = (0..latent.rows())
            .map(|row| self.predict(latent.row(row)) + self.noise.sample(rng))
            .collect();
        latent.with_column(self.dependent, &outcome)
    }
}

/// Outcome column regressed on raw continuous draws.
#[derive(Debug, Clone)]
pub struct OutcomeModel {
    /// `(continuous index, beta)` in plan order.
    regressors: Vec<(usize, f64)>,
    intercept: f64,
    noise: Normal<f64>,
}

impl OutcomeModel {
    /// Resolve coefficient names against the continuous columns in `names` order.
    pub fn resolve(names: &[&str], spec: &OutcomeSpec, path: &str) -> Result<Self> {
        let regressors = spec
            .coefficients
            .iter()
            .map(|(name, beta)| {
                names
                    .iter()
                    .position(|candidate| candidate == name)
                    .map(|idx| (idx, *beta))
                    .ok_or_else(|| {
                        Error::invalid_parameter(
                            format!("{path}/coefficients/{name}"),
                            format!("'{name}' is not a continuous column"),
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        if regressors.is_empty() {
            return Err(Error::invalid_parameter(
                format!("{path}/coefficients"),
                "at least one continuous regressor is required",
            ));
        }
        let noise = Normal::new(0.0, spec.noise_std).map_err(|err| {
            Error::invalid_parameter(format!("{path}/noise_std"), err.to_string())
        })?;
        Ok(Self {
            regressors,
            intercept: spec.intercept,
            noise,
        })
    }

    /// `intercept + sum(beta * x) + noise` per row of the continuous columns.
    pub fn apply<R: Rng + ?Sized>(&self, continuous: &[Vec<f64>], rng: &mut R) -> Result<Vec<f64>> {
        let mut rows = None;
        for (col, _) in &self.regressors {
            let column = continuous.get(*col).ok_or_else(|| {
                Error::invalid_parameter(
                    "/outcomes",
                    format!("regressor {col} is beyond the {} continuous columns", continuous.len()),
                )
            })?;
            match rows {
                None => rows = Some(column.len()),
                Some(expected) if expected != column.len() => {
                    return Err(Error::mismatched_length(
                        format!("/continuous/{col}"),
                        expected,
                        column.len(),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok((0..rows.unwrap_or(0))
            .map(|row| {
                self.regressors
                    .iter()
                    .fold(self.intercept, |acc, (col, beta)| acc + beta * continuous[*col][row])
                    + self.noise.sample(rng)
            })
            .collect())
    }
}
