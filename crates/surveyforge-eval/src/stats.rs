//! Descriptive statistics over numeric columns.
//!
//! Variances use the sample (n - 1) denominator. Functions return `None`
//! when the statistic is undefined for the input rather than NaN.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some(sum_sq / (values.len() - 1) as f64)
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Pearson correlation; `None` for unequal lengths or a constant input.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// Cronbach's alpha of a scale given as item columns.
///
/// `k / (k - 1) * (1 - sum(item variances) / variance(total))`.
pub fn cronbach_alpha(items: &[Vec<f64>]) -> Option<f64> {
    let k = items.len();
    if k < 2 {
        return None;
    }
    let rows = items[0].len();
    if items.iter().any(|item| item.len() != rows) {
        return None;
    }
    let item_variance: f64 = items
        .iter()
        .map(|item| variance(item))
        .sum::<Option<f64>>()?;
    let totals = row_sums(items, rows);
    let total_variance = variance(&totals)?;
    if total_variance == 0.0 {
        return None;
    }
    let k = k as f64;
    Some(k / (k - 1.0) * (1.0 - item_variance / total_variance))
}

/// Mean of all pairwise item correlations; pairs with a constant item are skipped.
pub fn mean_inter_item_correlation(items: &[Vec<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    let mut pairs = 0_usize;
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if let Some(r) = pearson(&items[i], &items[j]) {
                sum += r;
                pairs += 1;
            }
        }
    }
    (pairs > 0).then(|| sum / pairs as f64)
}

/// Per-row mean of the item columns.
pub fn scale_scores(items: &[Vec<f64>]) -> Vec<f64> {
    let rows = items.first().map(Vec::len).unwrap_or(0);
    let count = items.len() as f64;
    row_sums(items, rows)
        .into_iter()
        .map(|total| total / count)
        .collect()
}

fn row_sums(items: &[Vec<f64>], rows: usize) -> Vec<f64> {
    (0..rows)
        .map(|row| items.iter().map(|item| item[row]).sum())
        .collect()
}
