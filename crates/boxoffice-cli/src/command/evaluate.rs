use std::path::{Path, PathBuf};

use anyhow::Context;
use boxoffice_analysis::csv_io::{self, CsvFormat};
use boxoffice_training::{
    dataset::Dataset,
    evaluation::Evaluator,
    persistence::{self, PersistedModel},
};
use chrono::Utc;
use polars::prelude::DataFrame;

use crate::{config::AppConfig, report};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Processed table produced by `preprocess`
    input: PathBuf,
    #[clap(flatten)]
    output: EvaluateOutputArg,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateOutputArg {
    /// Directory the best model is saved to
    #[arg(long, default_value = "models")]
    pub models_dir: PathBuf,
}

pub(crate) fn run(arg: &EvaluateArg, config: &AppConfig) -> anyhow::Result<()> {
    let table = csv_io::read_table_file(&arg.input, &CsvFormat::processed())
        .with_context(|| format!("Failed to load processed table: {}", arg.input.display()))?;
    evaluate(&table, &arg.output.models_dir, config)?;
    Ok(())
}

/// Evaluates the model menu on `table`, prints the report and saves the best model
pub(crate) fn evaluate(
    table: &DataFrame,
    models_dir: &Path,
    config: &AppConfig,
) -> anyhow::Result<PathBuf> {
    let target = &config.evaluation.target;
    let dataset = Dataset::from_table(table, target)
        .with_context(|| format!("Failed to build dataset with target '{target}'"))?;
    tracing::info!(
        rows = dataset.len(),
        features = dataset.n_features(),
        models = config.models.len(),
        "evaluating model menu"
    );

    let evaluator = Evaluator::new(config.evaluation.clone(), config.models.clone());
    let report = evaluator.evaluate(&dataset)?;
    report::print_evaluation(&report);

    let best = report.best().context("No model was evaluated")?;
    let (model_config, model) = evaluator
        .fit_best(&report, &dataset)
        .context("No model was evaluated")?;
    let record = PersistedModel {
        label: model_config.label,
        trained_at: Utc::now(),
        feature_names: dataset.feature_names().to_vec(),
        target: target.clone(),
        cv_metrics: Some(best.cv.into()),
        model,
    };
    let path = persistence::save_model(&record, models_dir)
        .with_context(|| format!("Failed to save model '{}'", record.label))?;
    println!();
    println!("Best model: {} (saved to {})", record.label, path.display());
    Ok(path)
}
