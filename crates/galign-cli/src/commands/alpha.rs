use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use galign_core::NetworkPair;
use galign_exp::{
    AlphaParams, ObjectiveCalibrator, ObjectiveMode, ScoreTable, DEFAULT_SCORE_TABLE,
};

#[derive(Args, Debug)]
pub struct AlphaArgs {
    /// Baseline score table.
    #[arg(long, default_value = DEFAULT_SCORE_TABLE)]
    pub score_table: PathBuf,
    /// Score table method key, e.g. `lgraal` or `sanaec`.
    #[arg(long)]
    pub method: String,
    /// Source graph name.
    #[arg(long)]
    pub g1: String,
    /// Target graph name.
    #[arg(long)]
    pub g2: String,
    /// Tradeoff in [0, 1] towards topology.
    #[arg(long)]
    pub beta: f64,
}

pub fn run(args: &AlphaArgs) -> Result<(), Box<dyn Error>> {
    let table = ScoreTable::load(&args.score_table)?;
    let calibrator = ObjectiveCalibrator::new(Arc::new(table));
    let pair = NetworkPair::new(args.g1.clone(), args.g2.clone());
    let alpha = calibrator.derive_alpha(
        ObjectiveMode::Beta,
        &AlphaParams {
            alpha: None,
            beta: Some(args.beta),
            method_key: &args.method,
            pair: &pair,
        },
    )?;
    println!("{alpha}");
    Ok(())
}
