use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use cfknn_core::evaluation::{evaluate, EvaluationReport, MetricResult};
use cfknn_core::io::read_ratings_with_config;

use super::input::EvaluateConfig;

/// Load the ratings, run the evaluation and write the report if an output file
/// is configured.
pub fn run_evaluation(config: &EvaluateConfig) -> Result<EvaluationReport> {
    let ratings = read_ratings_with_config(&config.ratings, &config.reader)?;
    log::info!(
        "Evaluating k={} similarity={} role={} on {}",
        config.model.k,
        config.model.similarity,
        config.model.role,
        config.ratings
    );

    let report = evaluate(&ratings, &config.model, &config.evaluation)
        .with_context(|| format!("Evaluation of {} failed", config.ratings))?;

    if let Some(output_file) = &config.output_file {
        write_report(&report, output_file)?;
        log::info!("Wrote evaluation report to {}", output_file);
    }
    Ok(report)
}

pub fn write_report<P: AsRef<Path>>(report: &EvaluationReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

/// One line per metric, for the terminal.
pub fn format_summary(report: &EvaluationReport) -> String {
    let mut lines = vec![
        format_metric("RMSE", &report.rmse),
        format_metric("MAE", &report.mae),
    ];
    if let Some(hr) = &report.hit_rate {
        lines.push(format_metric(&format!("HR@{}", report.options.top_k), hr));
    }
    lines.join("\n")
}

fn format_metric(name: &str, metric: &MetricResult) -> String {
    let value = metric
        .value
        .map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v));
    format!(
        "{}: {} ({} evaluated, {} skipped)",
        name, value, metric.evaluated, metric.skipped
    )
}
