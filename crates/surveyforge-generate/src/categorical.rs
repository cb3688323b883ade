use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use surveyforge_core::{Error, Result};
use surveyforge_plan::CategoricalVarSpec;

/// I.i.d. label sampler for one categorical variable.
///
/// Construction rejects malformed specs; probabilities that do not sum to 1
/// are an error, never renormalized.
#[derive(Debug, Clone)]
pub struct CategoricalSampler {
    categories: Vec<String>,
    index: WeightedIndex<f64>,
}

impl CategoricalSampler {
    pub fn new(spec: &CategoricalVarSpec, path: &str) -> Result<Self> {
        spec.validate(path)?;
        let index = WeightedIndex::new(&spec.probabilities).map_err(|err| {
            Error::invalid_probability(format!("{path}/probabilities"), err.to_string())
        })?;
        Ok(Self {
            categories: spec.categories.clone(),
            index,
        })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn sample<R: Rng + ?Sized>(&self, sample_count: usize, rng: &mut R) -> Vec<String> {
        (0..sample_count)
            .map(|_| self.categories[self.index.sample(rng)].clone())
            .collect()
    }
}
