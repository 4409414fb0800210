use std::path::PathBuf;

use crate::{config::AppConfig, report};

use super::{
    evaluate::{self, EvaluateOutputArg},
    preprocess::{self, PreprocessOutputArg},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    /// Raw export to process
    input: PathBuf,
    #[clap(flatten)]
    preprocess: PreprocessOutputArg,
    #[clap(flatten)]
    evaluate: EvaluateOutputArg,
}

pub(crate) fn run(arg: &RunArg, config: &AppConfig) -> anyhow::Result<()> {
    let processed = preprocess::preprocess(&arg.input, &arg.preprocess, config)?;
    report::print_pipeline_report(&processed.report);
    evaluate::evaluate(&processed.table, &arg.evaluate.models_dir, config)?;
    Ok(())
}
