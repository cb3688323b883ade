//! Cronbach's alpha to uniform inter-item correlation.
//!
//! Under the standardized-item assumption a scale of `k` items whose pairwise
//! correlations all equal `r` has alpha `k r / (1 + (k - 1) r)`. Solving for
//! `r` gives `r = alpha / (k - alpha (k - 1))`.

use surveyforge_core::{CorrelationMatrix, Error, Result};

/// Uniform pairwise correlation producing `target_alpha` over `item_count` items.
pub fn inter_item_correlation(target_alpha: f64, item_count: u32) -> Result<f64> {
    if item_count < 2 {
        return Err(Error::invalid_parameter(
            "item_count",
            format!("alpha is undefined for fewer than 2 items, found {item_count}"),
        ));
    }
    if !target_alpha.is_finite() || !(0.0..1.0).contains(&target_alpha) {
        return Err(Error::invalid_parameter(
            "target_alpha",
            format!("must lie in [0, 1), found {target_alpha}"),
        ));
    }

    let k = f64::from(item_count);
    let denominator = k - target_alpha * (k - 1.0);
    if denominator <= 0.0 {
        return Err(Error::invalid_parameter(
            "target_alpha",
            format!("alpha {target_alpha} with {item_count} items yields a degenerate correlation"),
        ));
    }

    let r = target_alpha / denominator;
    if !(-1.0..=1.0).contains(&r) {
        return Err(Error::invalid_parameter(
            "target_alpha",
            format!("implied inter-item correlation {r} lies outside [-1, 1]"),
        ));
    }
    Ok(r)
}

/// Standardized alpha implied by a uniform correlation `r` over `item_count` items.
pub fn standardized_alpha(r: f64, item_count: u32) -> f64 {
    let k = f64::from(item_count);
    k * r / (1.0 + (k - 1.0) * r)
}

/// Items-by-items matrix with 1 on the diagonal and `r` elsewhere, PSD-checked.
pub fn uniform_correlation_matrix(item_count: u32, r: f64) -> Result<CorrelationMatrix> {
    CorrelationMatrix::uniform("inter_item_correlation", item_count as usize, r)
}

/// Solved item-level structure for several scales sharing one target alpha.
#[derive(Debug, Clone)]
pub struct AlphaStructure {
    /// Block-diagonal matrix over every item of every scale.
    pub matrix: CorrelationMatrix,
    /// Pairwise correlation inside each block, in block order.
    pub correlations: Vec<f64>,
}

/// One uniform block per scale; scales are uncorrelated with each other.
pub fn alpha_structure(target_alpha: f64, item_counts: &[u32]) -> Result<AlphaStructure> {
    let mut blocks = Vec::with_capacity(item_counts.len());
    let mut correlations = Vec::with_capacity(item_counts.len());
    for &item_count in item_counts {
        let r = inter_item_correlation(target_alpha, item_count)?;
        blocks.push(uniform_correlation_matrix(item_count, r)?);
        correlations.push(r);
    }
    Ok(AlphaStructure {
        matrix: CorrelationMatrix::block_diagonal(&blocks),
        correlations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_items_at_point_eight_give_one_half() {
        let r = inter_item_correlation(0.8, 4).expect("solvable");
        assert!((r - 0.5).abs() < 1e-12);
        assert!((standardized_alpha(r, 4) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn zero_alpha_means_uncorrelated_items() {
        assert_eq!(inter_item_correlation(0.0, 6).expect("solvable"), 0.0);
    }

    #[test]
    fn rejects_single_item_and_alpha_of_one() {
        assert!(inter_item_correlation(0.7, 1).is_err());
        assert!(inter_item_correlation(1.0, 5).is_err());
        assert!(inter_item_correlation(f64::NAN, 5).is_err());
        assert!(inter_item_correlation(-0.1, 5).is_err());
    }
}
