use std::error::Error;
use std::io;

use clap::{Parser, Subcommand};
use commands::{
    alpha::{self, AlphaArgs},
    experiment::{self, ExperimentArgs},
    method::{self, MethodArgs},
    sweep::{self, SweepArgs},
};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "galign", about = "Graph alignment experiment and calibration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect scores of an experiment and write its reports.
    Experiment(ExperimentArgs),
    /// Submit or harvest a two parameter sweep.
    Sweep(SweepArgs),
    /// Derive alpha from beta and the baseline score table.
    Alpha(AlphaArgs),
    /// Build a method from its configuration and optionally run it.
    Method(MethodArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_writer(io::stderr).with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Experiment(args) => experiment::run(&args),
        Command::Sweep(args) => sweep::run(&args),
        Command::Alpha(args) => alpha::run(&args),
        Command::Method(args) => method::run(&args),
    }
}
