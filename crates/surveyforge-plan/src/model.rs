use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use surveyforge_core::{Error, Result};

/// Contract version for the survey plan format.
pub const PLAN_VERSION: &str = "0.1";

/// Default standard deviation of the per-item jitter added to latent scores.
pub const DEFAULT_ITEM_JITTER_STD: f64 = 0.3;
/// Default standard deviation of the regression noise term.
pub const DEFAULT_NOISE_STD: f64 = 0.5;
/// Probability vectors must sum to 1 within this tolerance.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;
/// Largest supported `decimals` rounding mode.
pub const MAX_DECIMALS: u32 = 15;
/// Labels assigned by `quartile_labels` rounding, lowest quartile first.
pub const QUARTILE_LABELS: [&str; 4] = ["A", "B", "C", "D"];
/// Integer columns must keep `|mean| + INTEGER_RANGE_SDS * std` below 2^53,
/// where every integer is still exact as f64.
pub const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;
pub const INTEGER_RANGE_SDS: f64 = 8.0;

/// Canonical configuration for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurveyPlan {
    /// Contract version for the plan format.
    pub plan_version: String,
    /// Seed for reproducibility; a fresh seed is drawn when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Number of rows (respondents) to generate.
    pub sample_count: usize,
    /// Number of Likert response points (5 or 7).
    #[serde(default)]
    pub likert_scale: LikertScale,
    /// Standard deviation of the per-item jitter around the latent trait.
    #[serde(default = "default_item_jitter_std")]
    pub item_jitter_std: f64,
    /// Append `{variable}_score` columns with the latent values.
    #[serde(default)]
    pub emit_latent_scores: bool,
    /// Latent variables measured by Likert items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableSpec>,
    /// Correlation structure of the latent variables (identity when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latent: Option<LatentModel>,
    /// Optional regression deriving one latent variable from the others.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regression: Option<RegressionSpec>,
    /// Independent continuous measures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub continuous: Vec<ContinuousVarSpec>,
    /// Continuous outcomes regressed on the continuous measures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<OutcomeSpec>,
    /// Independent categorical variables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categorical: Vec<CategoricalVarSpec>,
}

fn default_item_jitter_std() -> f64 {
    DEFAULT_ITEM_JITTER_STD
}

fn default_noise_std() -> f64 {
    DEFAULT_NOISE_STD
}

impl SurveyPlan {
    /// Empty plan with defaults; stages are added by filling the spec lists.
    pub fn new(sample_count: usize) -> Self {
        Self {
            plan_version: PLAN_VERSION.to_string(),
            seed: None,
            sample_count,
            likert_scale: LikertScale::default(),
            item_jitter_std: DEFAULT_ITEM_JITTER_STD,
            emit_latent_scores: false,
            variables: Vec::new(),
            latent: None,
            regression: None,
            continuous: Vec::new(),
            outcomes: Vec::new(),
            categorical: Vec::new(),
        }
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables
            .iter()
            .map(|variable| variable.name.as_str())
            .collect()
    }

    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    /// Column names of every Likert item, in emission order.
    pub fn likert_column_names(&self) -> Vec<String> {
        self.variables
            .iter()
            .flat_map(|variable| variable.item_column_names())
            .collect()
    }

    /// Every column the plan produces, left to right.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.likert_column_names();
        if self.emit_latent_scores {
            names.extend(
                self.variables
                    .iter()
                    .map(|variable| variable.score_column_name()),
            );
        }
        names.extend(self.continuous.iter().map(|spec| spec.name.clone()));
        names.extend(self.outcomes.iter().map(|spec| spec.name.clone()));
        names.extend(self.categorical.iter().map(|spec| spec.name.clone()));
        names
    }
}

/// Latent variable measured by `item_count` Likert items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableSpec {
    pub name: String,
    pub item_count: u32,
    /// Location of the trait on the standard-normal latent scale. Positive
    /// values shift every item toward the top of the scale.
    #[serde(default)]
    pub mean: f64,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, item_count: u32) -> Self {
        Self {
            name: name.into(),
            item_count,
            mean: 0.0,
        }
    }

    pub fn with_mean(mut self, mean: f64) -> Self {
        self.mean = mean;
        self
    }

    pub fn item_column_names(&self) -> Vec<String> {
        (1..=self.item_count)
            .map(|item| format!("{}_Q{item}", self.name))
            .collect()
    }

    pub fn score_column_name(&self) -> String {
        format!("{}_score", self.name)
    }
}

/// Number of Likert response points; only 5 and 7 are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "u8", into = "u8")]
#[schemars(with = "u8")]
pub struct LikertScale(u8);

impl LikertScale {
    pub const FIVE: LikertScale = LikertScale(5);
    pub const SEVEN: LikertScale = LikertScale(7);

    pub fn new(points: u8) -> Result<Self> {
        match points {
            5 | 7 => Ok(Self(points)),
            other => Err(Error::invalid_parameter(
                "/likert_scale",
                format!("must be 5 or 7, found {other}"),
            )),
        }
    }

    pub fn points(self) -> u8 {
        self.0
    }
}

impl Default for LikertScale {
    fn default() -> Self {
        Self::FIVE
    }
}

impl TryFrom<u8> for LikertScale {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<LikertScale> for u8 {
    fn from(scale: LikertScale) -> Self {
        scale.0
    }
}

/// How the latent correlation structure is specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LatentModel {
    /// Explicit correlation matrix over the latent variables, in `variables` order.
    CorrelationMatrix { matrix: Vec<Vec<f64>> },
    /// Each variable's items share the uniform correlation implied by a
    /// target Cronbach's alpha; variables are mutually independent.
    TargetAlpha { target_alpha: f64 },
}

/// Linear model `dependent = intercept + sum(beta * regressor) + noise`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegressionSpec {
    pub dependent_variable: String,
    /// Coefficient for every other latent variable, keyed by name.
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default = "default_noise_std")]
    pub noise_std: f64,
    #[serde(default)]
    pub intercept: f64,
}

impl RegressionSpec {
    /// Check the spec against the plan's latent variable names.
    pub fn validate(&self, variable_names: &[&str]) -> Result<()> {
        if !variable_names.contains(&self.dependent_variable.as_str()) {
            return Err(Error::invalid_parameter(
                "/regression/dependent_variable",
                format!(
                    "'{}' is not a declared latent variable",
                    self.dependent_variable
                ),
            ));
        }
        if self.coefficients.contains_key(&self.dependent_variable) {
            return Err(Error::invalid_parameter(
                format!("/regression/coefficients/{}", self.dependent_variable),
                "the dependent variable cannot be its own regressor",
            ));
        }
        for (name, beta) in &self.coefficients {
            let path = format!("/regression/coefficients/{name}");
            if !variable_names.contains(&name.as_str()) {
                return Err(Error::invalid_parameter(
                    path,
                    format!("'{name}' is not a declared latent variable"),
                ));
            }
            if !beta.is_finite() {
                return Err(Error::invalid_parameter(path, "coefficient must be finite"));
            }
        }
        for name in variable_names {
            if *name != self.dependent_variable && !self.coefficients.contains_key(*name) {
                return Err(Error::invalid_parameter(
                    format!("/regression/coefficients/{name}"),
                    "missing coefficient for regressor",
                ));
            }
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(Error::invalid_parameter(
                "/regression/noise_std",
                format!("must be finite and >= 0, found {}", self.noise_std),
            ));
        }
        if !self.intercept.is_finite() {
            return Err(Error::invalid_parameter(
                "/regression/intercept",
                "must be finite",
            ));
        }
        Ok(())
    }
}

/// Rounding applied to continuous values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round to the nearest integer and emit integers.
    Integer,
    /// Two decimal places.
    #[default]
    Float,
    /// A fixed number of decimal places.
    Decimals(u32),
    /// Replace values by `A`..`D` after the empirical quartiles of the column.
    QuartileLabels,
}

impl RoundingMode {
    /// Decimal places kept; `None` for integer and label output.
    pub fn decimals(self) -> Option<u32> {
        match self {
            RoundingMode::Integer | RoundingMode::QuartileLabels => None,
            RoundingMode::Float => Some(2),
            RoundingMode::Decimals(places) => Some(places),
        }
    }

    pub fn is_labels(self) -> bool {
        self == RoundingMode::QuartileLabels
    }

    fn validate(self, path: &str, mean: f64, std: f64) -> Result<()> {
        match self {
            RoundingMode::Decimals(places) if places > MAX_DECIMALS => {
                Err(Error::invalid_parameter(
                    format!("{path}/rounding"),
                    format!("decimals must be at most {MAX_DECIMALS}, found {places}"),
                ))
            }
            RoundingMode::Integer if mean.abs() + INTEGER_RANGE_SDS * std > MAX_EXACT_INTEGER => {
                Err(Error::invalid_parameter(
                    format!("{path}/rounding"),
                    format!(
                        "integer output needs |mean| + {INTEGER_RANGE_SDS} * std <= 2^53, \
                         found mean {mean} and std {std}"
                    ),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Sampling family for a continuous variable, parameterized by mean/std.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    #[default]
    Normal,
    /// Uniform over `mean ± sqrt(3) * std`, matching the first two moments.
    Uniform,
    /// Poisson counts with `lambda = mean`; `std` is not used.
    Poisson,
}

/// Independent continuous measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContinuousVarSpec {
    pub name: String,
    pub mean: f64,
    pub std: f64,
    #[serde(default)]
    pub rounding: RoundingMode,
    #[serde(default)]
    pub distribution: Distribution,
}

impl ContinuousVarSpec {
    pub fn normal(name: impl Into<String>, mean: f64, std: f64, rounding: RoundingMode) -> Self {
        Self {
            name: name.into(),
            mean,
            std,
            rounding,
            distribution: Distribution::Normal,
        }
    }

    /// Standard deviation the column is drawn with.
    pub fn target_std(&self) -> f64 {
        match self.distribution {
            Distribution::Poisson => self.mean.sqrt(),
            Distribution::Normal | Distribution::Uniform => self.std,
        }
    }

    pub fn validate(&self, path: &str) -> Result<()> {
        if !self.mean.is_finite() {
            return Err(Error::invalid_parameter(
                format!("{path}/mean"),
                "must be finite",
            ));
        }
        if !self.std.is_finite() || self.std < 0.0 {
            return Err(Error::invalid_parameter(
                format!("{path}/std"),
                format!("must be finite and >= 0, found {}", self.std),
            ));
        }
        if self.distribution == Distribution::Poisson && self.mean <= 0.0 {
            return Err(Error::invalid_parameter(
                format!("{path}/mean"),
                "poisson distribution requires mean > 0",
            ));
        }
        self.rounding.validate(path, self.mean, self.target_std())?;
        if self.rounding.is_labels() {
            if self.distribution == Distribution::Poisson {
                return Err(Error::invalid_parameter(
                    format!("{path}/rounding"),
                    "quartile labels need distinct values; poisson counts tie at the quartiles",
                ));
            }
            if self.std == 0.0 {
                return Err(Error::invalid_parameter(
                    format!("{path}/std"),
                    "quartile labels need std > 0",
                ));
            }
        }
        Ok(())
    }
}

/// Continuous outcome `intercept + sum(beta * column) + N(0, noise_std)`.
///
/// Regressors are continuous columns of the same plan, taken before rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutcomeSpec {
    pub name: String,
    /// Coefficient per continuous column, keyed by column name.
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub intercept: f64,
    /// Noise standard deviation, in the outcome's own units.
    pub noise_std: f64,
    #[serde(default)]
    pub rounding: RoundingMode,
}

impl OutcomeSpec {
    pub fn new(
        name: impl Into<String>,
        intercept: f64,
        coefficients: &[(&str, f64)],
        noise_std: f64,
        rounding: RoundingMode,
    ) -> Self {
        Self {
            name: name.into(),
            coefficients: coefficients
                .iter()
                .map(|(column, beta)| (column.to_string(), *beta))
                .collect(),
            intercept,
            noise_std,
            rounding,
        }
    }

    /// Mean and standard deviation implied by the regressors' targets.
    ///
    /// Continuous columns are drawn independently, so the variances add.
    pub fn expected_moments(&self, continuous: &[ContinuousVarSpec]) -> (f64, f64) {
        let mut mean = self.intercept;
        let mut variance = self.noise_std * self.noise_std;
        for spec in continuous {
            if let Some(beta) = self.coefficients.get(&spec.name) {
                mean += beta * spec.mean;
                variance += (beta * spec.target_std()).powi(2);
            }
        }
        (mean, variance.sqrt())
    }

    pub fn validate(&self, path: &str, continuous: &[ContinuousVarSpec]) -> Result<()> {
        if self.coefficients.is_empty() {
            return Err(Error::invalid_parameter(
                format!("{path}/coefficients"),
                "at least one continuous regressor is required",
            ));
        }
        for (name, beta) in &self.coefficients {
            let coefficient_path = format!("{path}/coefficients/{name}");
            if !continuous.iter().any(|spec| spec.name == *name) {
                return Err(Error::invalid_parameter(
                    coefficient_path,
                    format!("'{name}' is not a continuous column"),
                ));
            }
            if !beta.is_finite() {
                return Err(Error::invalid_parameter(
                    coefficient_path,
                    "coefficient must be finite",
                ));
            }
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(Error::invalid_parameter(
                format!("{path}/noise_std"),
                format!("must be finite and >= 0, found {}", self.noise_std),
            ));
        }
        if !self.intercept.is_finite() {
            return Err(Error::invalid_parameter(
                format!("{path}/intercept"),
                "must be finite",
            ));
        }
        if self.rounding.is_labels() {
            return Err(Error::invalid_parameter(
                format!("{path}/rounding"),
                "outcomes are emitted as numbers",
            ));
        }
        let (mean, std) = self.expected_moments(continuous);
        self.rounding.validate(path, mean, std)
    }
}

/// Independent categorical variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoricalVarSpec {
    pub name: String,
    pub categories: Vec<String>,
    pub probabilities: Vec<f64>,
}

impl CategoricalVarSpec {
    pub fn new(name: impl Into<String>, categories: &[&str], probabilities: &[f64]) -> Self {
        Self {
            name: name.into(),
            categories: categories.iter().map(|label| label.to_string()).collect(),
            probabilities: probabilities.to_vec(),
        }
    }

    /// Reject malformed specs; probabilities are never renormalized.
    pub fn validate(&self, path: &str) -> Result<()> {
        if self.categories.len() != self.probabilities.len() {
            return Err(Error::mismatched_length(
                format!("{path}/probabilities"),
                self.categories.len(),
                self.probabilities.len(),
            ));
        }
        if self.categories.is_empty() {
            return Err(Error::invalid_parameter(
                format!("{path}/categories"),
                "at least one category is required",
            ));
        }
        let mut seen = HashSet::new();
        for label in &self.categories {
            if !seen.insert(label.as_str()) {
                return Err(Error::invalid_parameter(
                    format!("{path}/categories"),
                    format!("duplicate category '{label}'"),
                ));
            }
        }
        for (idx, probability) in self.probabilities.iter().enumerate() {
            if !probability.is_finite() || *probability < 0.0 {
                return Err(Error::invalid_probability(
                    format!("{path}/probabilities/{idx}"),
                    format!("must be finite and >= 0, found {probability}"),
                ));
            }
        }
        let total: f64 = self.probabilities.iter().sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(Error::invalid_probability(
                format!("{path}/probabilities"),
                format!("must sum to 1 (tolerance {PROBABILITY_TOLERANCE}), found {total}"),
            ));
        }
        Ok(())
    }
}
