use crate::metrics::MetricsReport;
use crate::model::Deviation;

/// Render a deterministic markdown report from metrics and deviations.
pub fn render_report(
    metrics: &MetricsReport,
    deviations: &[Deviation],
    max_examples: usize,
) -> String {
    let mut lines = Vec::new();

    lines.push("# Surveyforge Evaluation Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- run_id: {}", metrics.run_id));
    lines.push(format!("- plan_version: {}", metrics.plan_ref.plan_version));
    lines.push(format!(
        "- seed: {}",
        metrics
            .plan_ref
            .seed
            .map(|seed| seed.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    lines.push(format!(
        "- plan_fingerprint: {}",
        metrics.plan_ref.plan_fingerprint
    ));
    lines.push(format!(
        "- rows: {} found / {} expected",
        metrics.rows_found, metrics.rows_expected
    ));
    lines.push(String::new());

    if !metrics.scales.is_empty() {
        lines.push("## Scale reliability".to_string());
        lines.push("| variable | items | cronbach_alpha | mean_inter_item_r | target_alpha |".to_string());
        lines.push("| --- | --- | --- | --- | --- |".to_string());
        for scale in &metrics.scales {
            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                scale.variable,
                scale.items,
                fmt_opt(scale.cronbach_alpha),
                fmt_opt(scale.mean_inter_item_correlation),
                fmt_opt(scale.target_alpha)
            ));
        }
        lines.push(String::new());
    }

    if !metrics.score_correlations.is_empty() {
        lines.push("## Scale score correlations".to_string());
        lines.push("| pair | observed | latent_target |".to_string());
        lines.push("| --- | --- | --- |".to_string());
        for pair in &metrics.score_correlations {
            lines.push(format!(
                "| {} ~ {} | {} | {} |",
                pair.left,
                pair.right,
                fmt_opt(pair.observed),
                fmt_opt(pair.latent_target)
            ));
        }
        lines.push(String::new());
    }

    if !metrics.continuous.is_empty() {
        lines.push("## Continuous columns".to_string());
        lines.push("| column | mean | target_mean | std | target_std | min | max |".to_string());
        lines.push("| --- | --- | --- | --- | --- | --- | --- |".to_string());
        for column in &metrics.continuous {
            lines.push(format!(
                "| {} | {} | {:.3} | {} | {:.3} | {} | {} |",
                column.name,
                fmt_opt(column.mean),
                column.target_mean,
                fmt_opt(column.std),
                column.target_std,
                fmt_opt(column.min),
                fmt_opt(column.max)
            ));
        }
        lines.push(String::new());
    }

    if !metrics.categorical.is_empty() {
        lines.push("## Categorical columns".to_string());
        lines.push("| column | category | count | observed | expected |".to_string());
        lines.push("| --- | --- | --- | --- | --- |".to_string());
        for column in &metrics.categorical {
            for frequency in &column.frequencies {
                lines.push(format!(
                    "| {} | {} | {} | {:.3} | {:.3} |",
                    column.name,
                    frequency.category,
                    frequency.count,
                    frequency.observed,
                    frequency.expected
                ));
            }
        }
        lines.push(String::new());
    }

    if !metrics.warnings.is_empty() {
        lines.push("## Warnings".to_string());
        for warning in &metrics.warnings {
            let hint = warning
                .hint
                .as_ref()
                .map(|hint| format!(" (hint: {hint})"))
                .unwrap_or_default();
            lines.push(format!("- {}: {}{}", warning.path, warning.message, hint));
        }
        lines.push(String::new());
    }

    if !deviations.is_empty() {
        lines.push("## Top deviations".to_string());
        for deviation in deviations.iter().take(max_examples) {
            lines.push(format!(
                "- {} [{}]: {}",
                deviation.path, deviation.code, deviation.message
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Recommendations".to_string());
    lines.extend(recommendations(metrics, deviations));
    lines.join("\n")
}

fn fmt_opt(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.3}"))
        .unwrap_or_else(|| "-".to_string())
}

fn recommendations(metrics: &MetricsReport, deviations: &[Deviation]) -> Vec<String> {
    let mut lines = Vec::new();
    let has = |code: &str| deviations.iter().any(|deviation| deviation.code == code);
    if has("row_count_mismatch") {
        lines.push("- the dataset does not have the planned number of rows.".to_string());
    }
    if has("alpha_out_of_tolerance") {
        lines.push("- add items per scale or raise sample_count to stabilize alpha.".to_string());
    }
    if has("frequency_out_of_tolerance") || has("mean_out_of_tolerance") {
        lines.push("- raise sample_count; small samples drift from configured targets.".to_string());
    }
    if metrics.rows_found < 30 {
        lines.push("- fewer than 30 rows: treat every statistic as unreliable.".to_string());
    }
    if deviations.is_empty() {
        lines.push("- no deviations detected; compare metrics across seeds for drift.".to_string());
    }
    lines
}
