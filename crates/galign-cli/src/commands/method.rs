use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use galign_core::{Budget, MeasureCombination, NamedGraph};
use galign_exp::{
    CommandDriver, KernelTerm, LazyScoreTable, MethodArgs as MethodConfig, MethodFactory,
    ObjectiveCalibrator, SearchDriver, DEFAULT_SCORE_TABLE,
};
use serde_json::json;

#[derive(Args, Debug)]
pub struct MethodArgs {
    /// YAML method configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Source graph name.
    #[arg(long)]
    pub g1: String,
    /// Source graph node count.
    #[arg(long)]
    pub g1_nodes: usize,
    /// Target graph name.
    #[arg(long)]
    pub g2: String,
    /// Target graph node count.
    #[arg(long)]
    pub g2_nodes: usize,
    /// Objective term as `name=weight`, or `name=weight:local` for a node
    /// similarity term; repeatable.
    #[arg(long = "objective", value_name = "NAME=WEIGHT[:local]", value_parser = parse_term)]
    pub objective: Vec<ObjectiveTerm>,
    /// Baseline score table, read only when beta calibration needs it.
    #[arg(long, default_value = DEFAULT_SCORE_TABLE)]
    pub score_table: PathBuf,
    /// External aligner executing the search kernels.
    #[arg(long, default_value = "./aligner")]
    pub aligner: PathBuf,
    /// Directory for kernel requests and outputs.
    #[arg(long, default_value = "galign-work")]
    pub work_dir: PathBuf,
    /// Run the method and write the alignment to this path.
    #[arg(long)]
    pub run: Option<PathBuf>,
}

/// One `--objective` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveTerm {
    pub name: String,
    pub weight: f64,
    pub local: bool,
}

impl ObjectiveTerm {
    fn measure(&self) -> KernelTerm {
        if self.local {
            KernelTerm::local(self.name.clone())
        } else {
            KernelTerm::new(self.name.clone())
        }
    }
}

fn parse_term(raw: &str) -> Result<ObjectiveTerm, String> {
    let (name, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=WEIGHT, got `{raw}`"))?;
    let (weight, local) = match rest.split_once(':') {
        Some((weight, "local")) => (weight, true),
        Some((_, flag)) => return Err(format!("unknown flag `{flag}` on `{name}`")),
        None => (rest, false),
    };
    let weight: f64 = weight
        .trim()
        .parse()
        .map_err(|_| format!("weight of `{name}` is not a number"))?;
    Ok(ObjectiveTerm {
        name: name.trim().to_string(),
        weight,
        local,
    })
}

pub fn run(args: &MethodArgs) -> Result<(), Box<dyn Error>> {
    let config = MethodConfig::load(&args.config)?;
    let g1 = NamedGraph::new(args.g1.clone(), args.g1_nodes);
    let g2 = NamedGraph::new(args.g2.clone(), args.g2_nodes);

    let mut objective = MeasureCombination::new();
    for term in &args.objective {
        objective.add(Arc::new(term.measure()), term.weight)?;
    }

    let calibrator = ObjectiveCalibrator::new(Arc::new(LazyScoreTable::new(&args.score_table)));
    let driver: Arc<dyn SearchDriver> =
        Arc::new(CommandDriver::new(&args.aligner, &args.work_dir));
    let factory = MethodFactory::new(calibrator, driver);
    let mut method = factory.build(&g1, &g2, &config, &mut objective)?;

    let summary = json!({
        "method": method.name(),
        "parameters": method.parameters(),
        "objective": objective.weights(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(out) = &args.run {
        let mut budget = config.minutes.map(Budget::minutes).unwrap_or_default();
        if let Some(iterations) = config.lgraal_iter {
            budget = budget.with_iterations(iterations);
        }
        let alignment = method.produce_alignment(&g1, &g2, &objective, &budget)?;
        alignment.write(out)?;
        println!("alignment written to {}", out.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use galign_core::Measure;

    #[test]
    fn objective_terms_parse() {
        let ec = parse_term("ec=0.25").unwrap();
        assert_eq!((ec.name.as_str(), ec.weight, ec.local), ("ec", 0.25, false));
        assert!(!ec.measure().is_local());
        let sim = parse_term("nodesim=1:local").unwrap();
        assert_eq!((sim.name.as_str(), sim.weight, sim.local), ("nodesim", 1.0, true));
        assert!(sim.measure().is_local());
        assert!(parse_term("ec").is_err());
        assert!(parse_term("ec=high").is_err());
        assert!(parse_term("ec=1:fast").is_err());
    }
}
