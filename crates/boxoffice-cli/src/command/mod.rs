use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

use self::{
    evaluate::EvaluateArg, explore::ExploreArg, predict::PredictArg, preprocess::PreprocessArg,
    run_all::RunArg,
};

mod evaluate;
mod explore;
mod predict;
mod preprocess;
mod run_all;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// JSON configuration overriding column labels, evaluation settings and the model menu
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Print a first-look summary of a raw export
    Explore(#[clap(flatten)] ExploreArg),
    /// Turn a raw export into a processed, model-ready table
    Preprocess(#[clap(flatten)] PreprocessArg),
    /// Compare the model menu on a processed table and save the best model
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Apply a saved model to a processed table
    Predict(#[clap(flatten)] PredictArg),
    /// Preprocess then evaluate in one go
    Run(#[clap(flatten)] RunArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let config = AppConfig::load(args.config.as_deref())?;
    match args.mode {
        Mode::Explore(arg) => explore::run(&arg, &config)?,
        Mode::Preprocess(arg) => preprocess::run(&arg, &config)?,
        Mode::Evaluate(arg) => evaluate::run(&arg, &config)?,
        Mode::Predict(arg) => predict::run(&arg)?,
        Mode::Run(arg) => run_all::run(&arg, &config)?,
    }
    Ok(())
}
