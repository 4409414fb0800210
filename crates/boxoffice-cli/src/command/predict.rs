use std::path::PathBuf;

use anyhow::{Context, ensure};
use boxoffice_analysis::{
    csv_io::{self, CsvFormat},
    frame::{self, format_number},
};
use boxoffice_training::{dataset::Dataset, persistence};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PredictArg {
    /// Saved model file
    #[arg(long)]
    model: PathBuf,
    /// Processed table to predict for
    input: PathBuf,
    /// Output CSV file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &PredictArg) -> anyhow::Result<()> {
    let PredictArg {
        model,
        input,
        output,
    } = arg;
    let record = persistence::load_model(model)
        .with_context(|| format!("Failed to load model: {}", model.display()))?;
    let table = csv_io::read_table_file(input, &CsvFormat::processed())
        .with_context(|| format!("Failed to load processed table: {}", input.display()))?;

    let missing = record
        .feature_names
        .iter()
        .filter(|name| frame::require(&table, name).is_err())
        .map(String::as_str)
        .collect::<Vec<_>>();
    ensure!(
        missing.is_empty(),
        "Table {} lacks features the model was trained on: {}",
        input.display(),
        missing.join(", ")
    );

    let rows = Dataset::features_from_table(&table, &record.feature_names)
        .context("Feature columns must be numeric")?;
    let predictions = record.model.predict(&rows);
    tracing::info!(model = %record.label, rows = predictions.len(), "predicted");

    util::write_csv_column(
        util::create_output(output.as_deref())?,
        &format!("predicted_{}", record.target),
        predictions.into_iter().map(format_number),
    )
}
