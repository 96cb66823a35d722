use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use galign_exp::{BuiltinMeasures, CommandScheduler, ParameterSweep, SweepPlan};

#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(subcommand)]
    pub action: SweepAction,
}

#[derive(Subcommand, Debug)]
pub enum SweepAction {
    /// Write one script per grid point and hand it to the scheduler.
    Submit(SubmitArgs),
    /// Score whichever grid points have finished.
    Collect(CollectArgs),
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Submission program receiving each script path.
    #[arg(long, default_value = CommandScheduler::DEFAULT_PROGRAM)]
    pub scheduler: String,
    /// Extra arguments placed before the script path.
    #[arg(long = "scheduler-arg", value_name = "ARG")]
    pub scheduler_args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Text report path.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional CSV report path.
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub fn run(args: &SweepArgs) -> Result<(), Box<dyn Error>> {
    match &args.action {
        SweepAction::Submit(args) => submit(args),
        SweepAction::Collect(args) => collect(args),
    }
}

fn submit(args: &SubmitArgs) -> Result<(), Box<dyn Error>> {
    let plan = SweepPlan::load(&args.plan)?;
    let measures = BuiltinMeasures;
    let mut sweep = ParameterSweep::new(plan, &measures)?;
    let scheduler = CommandScheduler::new(args.scheduler.clone(), args.scheduler_args.clone());
    let manifest = sweep.submit_scripts_to_cluster(&scheduler)?;
    println!(
        "submitted {} grid points (plan {})",
        manifest.submitted.len(),
        manifest.plan_hash
    );
    Ok(())
}

fn collect(args: &CollectArgs) -> Result<(), Box<dyn Error>> {
    let plan = SweepPlan::load(&args.plan)?;
    let measures = BuiltinMeasures;
    let mut sweep = ParameterSweep::new(plan, &measures)?;
    let summary = sweep.collect_data()?;
    sweep.print_data(&args.out)?;
    if let Some(csv) = &args.csv {
        sweep.print_data_csv(csv)?;
    }
    println!(
        "completed {}, pending {}, not submitted {}",
        summary.completed, summary.pending, summary.not_submitted
    );
    Ok(())
}
