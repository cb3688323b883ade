//! Mapping latent scores to survey responses.

use rand::Rng;
use rand::distr::Uniform;
use rand_distr::{Distribution as _, Normal, Poisson};

use surveyforge_core::{CellValue, Error, Result};
use surveyforge_plan::{ContinuousVarSpec, Distribution, LikertScale, QUARTILE_LABELS, RoundingMode};

/// Standard-normal cumulative distribution function.
pub fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Complementary error function, fractional error below 1.2e-7.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let value = t * poly.exp();
    if x >= 0.0 { value } else { 2.0 - value }
}

/// Map one latent score onto `1..=scale`.
///
/// `round(cdf * scale)` can land on 0 in the lower tail; that, and anything
/// above the top point, is clipped.
pub fn likert_response(score: f64, scale: LikertScale) -> i64 {
    let points = i64::from(scale.points());
    let raw = (standard_normal_cdf(score) * points as f64).round_ties_even();
    if raw.is_nan() {
        return 1;
    }
    (raw as i64).clamp(1, points)
}

/// Emit one Likert item from a shared latent trait.
///
/// Each row gets independent `N(0, jitter_std)` noise before the transform,
/// so items of one trait correlate with each other without being identical.
pub fn likert_item<R: Rng + ?Sized>(
    latent: &[f64],
    jitter_std: f64,
    scale: LikertScale,
    rng: &mut R,
) -> Result<Vec<i64>> {
    let jitter = Normal::new(0.0, jitter_std)
        .map_err(|err| Error::invalid_parameter("/item_jitter_std", err.to_string()))?;
    Ok(latent
        .iter()
        .map(|score| likert_response(score + jitter.sample(rng), scale))
        .collect())
}

/// Round one value to `decimals` places, or to an integer when `None`.
///
/// The integer cast saturates at the i64 bounds; plan validation keeps
/// integer columns within 2^53.
pub fn round_value(value: f64, decimals: Option<u32>) -> CellValue {
    match decimals {
        None => CellValue::Int(value.round_ties_even() as i64),
        Some(decimals) => CellValue::Float {
            value: round_to(value, decimals),
            decimals,
        },
    }
}

/// Apply a rounding mode to a whole column.
pub fn round_column(values: &[f64], rounding: RoundingMode) -> Vec<CellValue> {
    if rounding.is_labels() {
        return quartile_labels(values);
    }
    values
        .iter()
        .map(|value| round_value(*value, rounding.decimals()))
        .collect()
}

/// Label each value `A`..`D` by the column's empirical quartiles.
///
/// Quartiles interpolate linearly between order statistics; a value equal
/// to an edge falls into the lower bin.
pub fn quartile_labels(values: &[f64]) -> Vec<CellValue> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let edges = [0.25, 0.5, 0.75].map(|p| quantile(&sorted, p));
    values
        .iter()
        .map(|value| {
            let bin = edges.iter().take_while(|edge| *value > **edge).count();
            CellValue::Text(QUARTILE_LABELS[bin].to_string())
        })
        .collect()
}

fn quantile(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let position = p * last as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(last);
    let fraction = position - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Continuous-variable sampler built from a validated spec.
#[derive(Debug, Clone)]
pub struct ContinuousSampler {
    kind: ContinuousKind,
    rounding: RoundingMode,
}

#[derive(Debug, Clone)]
enum ContinuousKind {
    Constant(f64),
    Normal(Normal<f64>),
    Uniform(Uniform<f64>),
    Poisson(Poisson<f64>),
}

impl ContinuousSampler {
    pub fn new(spec: &ContinuousVarSpec, path: &str) -> Result<Self> {
        spec.validate(path)?;
        let kind = match spec.distribution {
            Distribution::Normal => Normal::new(spec.mean, spec.std)
                .map(ContinuousKind::Normal)
                .map_err(|err| Error::invalid_parameter(format!("{path}/std"), err.to_string()))?,
            Distribution::Uniform => {
                let half_width = 3_f64.sqrt() * spec.std;
                if half_width == 0.0 {
                    ContinuousKind::Constant(spec.mean)
                } else {
                    Uniform::new_inclusive(spec.mean - half_width, spec.mean + half_width)
                        .map(ContinuousKind::Uniform)
                        .map_err(|err| {
                            Error::invalid_parameter(format!("{path}/std"), err.to_string())
                        })?
                }
            }
            Distribution::Poisson => Poisson::new(spec.mean)
                .map(ContinuousKind::Poisson)
                .map_err(|err| Error::invalid_parameter(format!("{path}/mean"), err.to_string()))?,
        };
        Ok(Self {
            kind,
            rounding: spec.rounding,
        })
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.kind {
            ContinuousKind::Constant(value) => *value,
            ContinuousKind::Normal(normal) => normal.sample(rng),
            ContinuousKind::Uniform(uniform) => uniform.sample(rng),
            ContinuousKind::Poisson(poisson) => poisson.sample(rng),
        }
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    /// Draw `sample_count` independent values before rounding.
    pub fn draw_values<R: Rng + ?Sized>(&self, sample_count: usize, rng: &mut R) -> Vec<f64> {
        (0..sample_count).map(|_| self.draw(rng)).collect()
    }

    /// Draw `sample_count` independent values, rounded per the spec.
    pub fn sample<R: Rng + ?Sized>(&self, sample_count: usize, rng: &mut R) -> Vec<CellValue> {
        round_column(&self.draw_values(sample_count, rng), self.rounding)
    }
}

/// Draw one continuous column of `sample_count` values.
pub fn continuous_column<R: Rng + ?Sized>(
    spec: &ContinuousVarSpec,
    path: &str,
    sample_count: usize,
    rng: &mut R,
) -> Result<Vec<CellValue>> {
    Ok(ContinuousSampler::new(spec, path)?.sample(sample_count, rng))
}
