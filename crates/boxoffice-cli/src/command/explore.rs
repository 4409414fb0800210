use std::path::PathBuf;

use anyhow::Context;
use boxoffice_analysis::{
    csv_io,
    exploration::{self, TableSummary, distinct_values},
    visualization::SvgChartSink,
};

use crate::{config::AppConfig, report};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ExploreArg {
    /// Raw export to inspect
    input: PathBuf,
    /// Number of leading rows to print
    #[arg(long, default_value_t = 5)]
    rows: usize,
    /// Root directory for chart artifacts
    #[arg(long, default_value = "plots")]
    plots_dir: PathBuf,
    /// Folder under the plots directory the charts are written to
    #[arg(long, default_value = "exploration")]
    plots_folder: String,
    /// Skip chart rendering
    #[arg(long)]
    no_plots: bool,
}

pub(crate) fn run(arg: &ExploreArg, config: &AppConfig) -> anyhow::Result<()> {
    let ExploreArg {
        input,
        rows,
        plots_dir,
        plots_folder,
        no_plots,
    } = arg;
    let preprocessing = &config.preprocessing;
    let table = csv_io::read_table_file(input, &preprocessing.input_format)
        .with_context(|| format!("Failed to load raw table: {}", input.display()))?;

    report::print_head(&table, *rows);
    report::print_summary(&TableSummary::new(&table));
    for name in &preprocessing.categorical {
        match distinct_values(&table, name) {
            Some(values) => report::print_distinct_values(name, &values),
            None => tracing::warn!(column = %name, "categorical column not found"),
        }
    }

    if !no_plots {
        let sink = SvgChartSink::new(plots_dir.clone());
        let written = exploration::render_exploration_charts(
            &table,
            &preprocessing.columns,
            &sink,
            plots_folder,
        );
        for path in written {
            tracing::info!(path = %path.display(), "wrote chart");
        }
    }
    Ok(())
}
