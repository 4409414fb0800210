use std::path::{Path, PathBuf};

use anyhow::Context;
use boxoffice_analysis::{
    pipeline::{PreprocessingPipeline, ProcessedTable},
    visualization::{NoopSink, SvgChartSink, VisualizationSink},
};

use crate::{config::AppConfig, report, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PreprocessArg {
    /// Raw export to process
    input: PathBuf,
    #[clap(flatten)]
    output: PreprocessOutputArg,
}

/// Output locations shared by `preprocess` and `run`
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PreprocessOutputArg {
    /// Processed table destination
    #[arg(long, default_value = "data/processed/processed.csv")]
    pub output: PathBuf,
    /// Root directory for chart artifacts
    #[arg(long, default_value = "plots")]
    pub plots_dir: PathBuf,
    /// Skip chart rendering
    #[arg(long)]
    pub no_plots: bool,
    /// Also save the fitted category vocabulary as JSON
    #[arg(long)]
    pub encoder_output: Option<PathBuf>,
}

pub(crate) fn run(arg: &PreprocessArg, config: &AppConfig) -> anyhow::Result<()> {
    let processed = preprocess(&arg.input, &arg.output, config)?;
    report::print_pipeline_report(&processed.report);
    Ok(())
}

pub(crate) fn preprocess(
    input: &Path,
    arg: &PreprocessOutputArg,
    config: &AppConfig,
) -> anyhow::Result<ProcessedTable> {
    let pipeline = PreprocessingPipeline::new(config.preprocessing.clone());
    let sink: Box<dyn VisualizationSink> = if arg.no_plots {
        Box::new(NoopSink)
    } else {
        Box::new(SvgChartSink::new(arg.plots_dir.clone()))
    };

    let processed = pipeline
        .run(input, &arg.output, sink.as_ref())
        .with_context(|| format!("Preprocessing failed for {}", input.display()))?;

    if let Some(path) = &arg.encoder_output {
        util::save_json(&processed.encoder, path)?;
        tracing::info!(path = %path.display(), "saved category vocabulary");
    }
    Ok(processed)
}
