//! Tabular reports printed to stdout

use boxoffice_analysis::{exploration::TableSummary, pipeline::PipelineReport};
use boxoffice_stats::metrics::RegressionMetrics;
use boxoffice_training::evaluation::{EvaluationReport, ModelEvaluation};
use polars::prelude::DataFrame;

const LABEL_WIDTH: usize = 40;

fn truncate(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_owned()
    } else {
        let mut s = label.chars().take(width - 1).collect::<String>();
        s.push('…');
        s
    }
}

fn print_section(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "=".repeat(title.chars().count()));
}

/// Prints the first `n` rows as a polars table
pub fn print_head(table: &DataFrame, n: usize) {
    print_section(&format!("First {} rows", n.min(table.height())));
    println!("{}", table.head(Some(n)));
}

pub fn print_summary(summary: &TableSummary) {
    let (rows, columns) = summary.shape();
    print_section("Columns");
    println!("  shape: {rows} rows x {columns} columns");
    println!(
        "  {:<LABEL_WIDTH$} {:>8} {:>10} {:>8}",
        "Column", "Type", "Non-null", "Nulls"
    );
    println!("  {}", "-".repeat(LABEL_WIDTH + 29));
    for column in &summary.columns {
        println!(
            "  {:<LABEL_WIDTH$} {:>8} {:>10} {:>8}",
            truncate(&column.name, LABEL_WIDTH),
            column.dtype.to_string(),
            column.non_null,
            column.nulls,
        );
    }

    print_section("Numeric columns");
    println!(
        "  {:<LABEL_WIDTH$} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"
    );
    println!("  {}", "-".repeat(LABEL_WIDTH + 85));
    for column in &summary.columns {
        let Some(numeric) = &column.numeric else {
            continue;
        };
        let stats = &numeric.stats;
        let quartile = |p| numeric.quartiles.get(p).unwrap_or(f64::NAN);
        println!(
            "  {:<LABEL_WIDTH$} {:>7} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            truncate(&column.name, LABEL_WIDTH),
            stats.count,
            stats.mean,
            stats.sample_std_dev,
            stats.min,
            quartile(25.0),
            quartile(50.0),
            quartile(75.0),
            stats.max,
        );
    }
}

pub fn print_distinct_values(name: &str, values: &[String]) {
    print_section(&format!("Distinct values of '{name}' ({})", values.len()));
    for value in values {
        println!("  {value}");
    }
}

pub fn print_pipeline_report(report: &PipelineReport) {
    print_section("Preprocessing");
    println!("  raw shape:        {} x {}", report.raw_rows, report.raw_columns);
    println!("  leakage dropped:  {}", report.dropped_leakage);
    println!(
        "  trailing column:  {}",
        report.dropped_trailing_column.as_deref().unwrap_or("kept")
    );
    println!("  prices filled:    {}", report.filled_prices);
    println!("  rows dropped:     {}", report.dropped_rows);
    println!(
        "  processed shape:  {} x {}",
        report.processed_rows, report.processed_columns
    );
}

fn print_metrics_header(label_col: &str) {
    println!(
        "  {:<24} {:>10} {:>12} {:>12}",
        label_col, "R²", "MAE", "RMSE"
    );
    println!("  {}", "-".repeat(61));
}

fn print_metrics_row(label: &str, metrics: &RegressionMetrics) {
    println!(
        "  {:<24} {:>10.4} {:>12.3} {:>12.3}",
        truncate(label, 24),
        metrics.r2,
        metrics.mae,
        metrics.rmse
    );
}

fn print_importances(evaluation: &ModelEvaluation) {
    let Some(top) = &evaluation.top_importances else {
        return;
    };
    println!("  Top {} features ({}):", top.len(), evaluation.label);
    for (rank, (name, importance)) in top.iter().enumerate() {
        println!(
            "    {:>2}. {:<LABEL_WIDTH$} {:>8.4}",
            rank + 1,
            truncate(name, LABEL_WIDTH),
            importance
        );
    }
}

pub fn print_evaluation(report: &EvaluationReport) {
    print_section("Hold-out split");
    print_metrics_header("Model");
    for evaluation in &report.evaluations {
        print_metrics_row(&evaluation.label, &evaluation.holdout);
    }
    println!();
    for evaluation in &report.evaluations {
        print_importances(evaluation);
    }

    print_section("Cross-validation (mean over folds)");
    print_metrics_header("Model");
    for evaluation in &report.evaluations {
        print_metrics_row(&evaluation.label, &evaluation.cv);
    }

    print_section("Ranking by cross-validated R²");
    print_metrics_header("Model");
    for (rank, evaluation) in report.ranked().enumerate() {
        print_metrics_row(&format!("{}. {}", rank + 1, evaluation.label), &evaluation.cv);
    }
}
