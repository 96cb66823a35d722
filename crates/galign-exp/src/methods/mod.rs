//! Method construction: a registry of named constructors, each validating
//! the configuration fields it needs.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use galign_core::errors::{AlignError, ErrorInfo};
use galign_core::{Graph, MeasureCombination, Method, NetworkPair, RestartScheme};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::objective::{AlphaParams, ObjectiveArgs, ObjectiveCalibrator, ObjectiveMode};
use crate::serde::from_yaml_slice;

mod driver;
mod variants;

pub use driver::{CommandDriver, SearchDriver, SearchRequest};
pub use variants::{
    Annealing, EvaluationOnly, KernelMethod, RandomAligner, Schedule, ScheduleSetting,
};

/// Resolved method configuration. Every field is optional; each constructor
/// checks only the fields its variant uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MethodArgs {
    /// Registered method name.
    #[serde(default)]
    pub method: Option<String>,
    /// Alignment to evaluate; overrides `method` when present.
    #[serde(default)]
    pub eval: Option<PathBuf>,
    /// Starting alignment for local search variants.
    #[serde(default)]
    pub start_alignment: Option<PathBuf>,
    /// Objective mode and tradeoff parameters.
    #[serde(flatten)]
    pub objective: ObjectiveArgs,
    /// Time budget in minutes.
    #[serde(default)]
    pub minutes: Option<f64>,
    /// L-GRAAL iteration limit.
    #[serde(default)]
    pub lgraal_iter: Option<u64>,
    /// Tabu list length.
    #[serde(default)]
    pub ntabus: Option<u32>,
    /// Neighbours sampled per tabu step.
    #[serde(default)]
    pub nneighbors: Option<u32>,
    /// Keep node tabus instead of move tabus.
    #[serde(default)]
    pub node_tabus: bool,
    /// Initial annealing temperature or `auto`.
    #[serde(default)]
    pub t_initial: Option<ScheduleSetting>,
    /// Annealing decay rate or `auto`.
    #[serde(default)]
    pub t_decay: Option<ScheduleSetting>,
    /// Enables the annealing restart scheme.
    #[serde(default)]
    pub restart: bool,
    /// Restart warm temperature.
    #[serde(default)]
    pub tnew: Option<f64>,
    /// Iterations between restart checkpoints.
    #[serde(default)]
    pub iter_per_step: Option<u64>,
    /// Restart candidate count.
    #[serde(default)]
    pub num_cand: Option<u32>,
    /// Candidate refinement temperature.
    #[serde(default)]
    pub tcand: Option<f64>,
    /// Final restart temperature.
    #[serde(default)]
    pub tfin: Option<f64>,
    /// Node similarity measure used by the voter method.
    #[serde(default)]
    pub wave_node_sim: Option<String>,
    /// Seed for the random aligner.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl MethodArgs {
    /// Loads method arguments from a YAML file.
    pub fn load(path: &Path) -> Result<Self, AlignError> {
        if !path.exists() {
            return Err(AlignError::missing_file(path));
        }
        let bytes = fs::read(path).map_err(|err| {
            AlignError::Io(
                ErrorInfo::new("method-args-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        from_yaml_slice(&bytes)
    }

    fn require<T: Copy>(value: Option<T>, field: &str) -> Result<T, AlignError> {
        value.ok_or_else(|| AlignError::missing_field(field))
    }

    fn restart_scheme(&self) -> Result<RestartScheme, AlignError> {
        Ok(RestartScheme {
            warm_temperature: Self::require(self.tnew, "tnew")?,
            iterations_per_step: Self::require(self.iter_per_step, "iter_per_step")?,
            candidates: Self::require(self.num_cand, "num_cand")?,
            candidate_temperature: Self::require(self.tcand, "tcand")?,
            final_temperature: Self::require(self.tfin, "tfin")?,
        })
    }
}

/// Inputs handed to a registered constructor.
pub struct MethodRequest<'a> {
    /// Source graph.
    pub g1: &'a dyn Graph,
    /// Target graph.
    pub g2: &'a dyn Graph,
    /// Pair identity of the two graphs.
    pub pair: NetworkPair,
    /// Resolved configuration.
    pub args: &'a MethodArgs,
    /// Objective, reweighted in place by search variants.
    pub objective: &'a mut MeasureCombination,
    /// Alpha derivation.
    pub calibrator: &'a ObjectiveCalibrator,
    /// Kernel execution backend.
    pub driver: &'a Arc<dyn SearchDriver>,
}

/// Named constructor stored in a [`MethodRegistry`].
pub type Constructor = fn(&mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError>;

/// Method name to constructor table.
#[derive(Clone)]
pub struct MethodRegistry {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.constructors.keys()).finish()
    }
}

impl MethodRegistry {
    /// Registry without any method.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registers or replaces the constructor for `name`.
    pub fn register(&mut self, name: &'static str, constructor: Constructor) {
        self.constructors.insert(name, constructor);
    }

    /// Constructor registered under `name`.
    pub fn get(&self, name: &str) -> Option<Constructor> {
        self.constructors.get(name).copied()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("none", build_none);
        registry.register("greedylccs", build_greedy);
        registry.register("wave", build_wave);
        registry.register("lgraal", build_lgraal);
        registry.register("hubalign", build_hubalign);
        registry.register("tabu", build_tabu);
        registry.register("sana", build_sana);
        registry.register("hc", build_hill_climbing);
        registry.register("random", build_random);
        registry
    }
}

/// Builds methods from configuration, wiring in the calibrated objective.
pub struct MethodFactory {
    registry: MethodRegistry,
    calibrator: ObjectiveCalibrator,
    driver: Arc<dyn SearchDriver>,
}

impl MethodFactory {
    /// Factory over the standard registry.
    pub fn new(calibrator: ObjectiveCalibrator, driver: Arc<dyn SearchDriver>) -> Self {
        Self::with_registry(MethodRegistry::default(), calibrator, driver)
    }

    /// Factory over a caller supplied registry.
    pub fn with_registry(
        registry: MethodRegistry,
        calibrator: ObjectiveCalibrator,
        driver: Arc<dyn SearchDriver>,
    ) -> Self {
        Self {
            registry,
            calibrator,
            driver,
        }
    }

    /// Registry in use.
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Builds the configured method. An `eval` path always yields the
    /// evaluation-only variant, whatever `method` says.
    pub fn build(
        &self,
        g1: &dyn Graph,
        g2: &dyn Graph,
        args: &MethodArgs,
        objective: &mut MeasureCombination,
    ) -> Result<Box<dyn Method>, AlignError> {
        if let Some(path) = &args.eval {
            debug!(path = %path.display(), "evaluation-only alignment overrides method");
            return Ok(Box::new(EvaluationOnly::new(path.clone())));
        }
        let result = self.dispatch(g1, g2, args, objective);
        if let Err(err) = &result {
            error!(%err, "method construction aborted");
        }
        result
    }

    fn dispatch(
        &self,
        g1: &dyn Graph,
        g2: &dyn Graph,
        args: &MethodArgs,
        objective: &mut MeasureCombination,
    ) -> Result<Box<dyn Method>, AlignError> {
        let name = args
            .method
            .as_deref()
            .ok_or_else(|| AlignError::missing_field("method"))?;
        let constructor = self.registry.get(name).ok_or_else(|| {
            AlignError::Config(
                ErrorInfo::new("method-unknown", format!("unknown method: {name}"))
                    .with_context("method", name)
                    .with_hint(format!("known methods: {}", self.registry.names().join(", "))),
            )
        })?;
        let mut request = MethodRequest {
            g1,
            g2,
            pair: NetworkPair::new(g1.name(), g2.name()),
            args,
            objective,
            calibrator: &self.calibrator,
            driver: &self.driver,
        };
        constructor(&mut request)
    }
}

fn path_value(path: &Option<PathBuf>) -> serde_json::Value {
    match path {
        Some(path) => json!(path.display().to_string()),
        None => serde_json::Value::Null,
    }
}

fn build_none(request: &mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError> {
    let path = request
        .args
        .start_alignment
        .clone()
        .ok_or_else(|| AlignError::missing_field("start_alignment"))?;
    Ok(Box::new(EvaluationOnly::new(path)))
}

fn build_greedy(request: &mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError> {
    let parameters = json!({ "start_alignment": path_value(&request.args.start_alignment) });
    Ok(Box::new(KernelMethod::new(
        "greedylccs",
        parameters,
        request.driver.clone(),
    )))
}

fn build_wave(request: &mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError> {
    let node_sim = request
        .args
        .wave_node_sim
        .as_deref()
        .ok_or_else(|| AlignError::missing_field("wave_node_sim"))?;
    let measure = request.objective.get_measure(node_sim).ok_or_else(|| {
        AlignError::invalid_value(
            "wave_node_sim",
            node_sim,
            "node similarity measure is not part of the objective",
        )
    })?;
    if !measure.is_local() {
        return Err(AlignError::invalid_value(
            "wave_node_sim",
            node_sim,
            "wave needs a local node similarity measure",
        ));
    }
    Ok(Box::new(KernelMethod::new(
        "wave",
        json!({ "node_sim": node_sim }),
        request.driver.clone(),
    )))
}

/// Alpha for the wrapped aligners. Both read the `lgraal` baselines.
fn wrapper_alpha(request: &MethodRequest<'_>, label: &str) -> Result<f64, AlignError> {
    let mode = request.args.objective.mode()?;
    if mode == ObjectiveMode::Generic {
        return Err(AlignError::invalid_value(
            "objfuntype",
            mode.to_string(),
            &format!("generic objective function not supported for {label}"),
        ));
    }
    request.calibrator.derive_alpha(
        mode,
        &AlphaParams {
            alpha: request.args.objective.alpha,
            beta: request.args.objective.beta,
            method_key: "lgraal",
            pair: &request.pair,
        },
    )
}

fn build_lgraal(request: &mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError> {
    let alpha = wrapper_alpha(request, "L-GRAAL")?;
    let iterations = MethodArgs::require(request.args.lgraal_iter, "lgraal_iter")?;
    let minutes = MethodArgs::require(request.args.minutes, "minutes")?;
    Ok(Box::new(KernelMethod::new(
        "lgraal",
        json!({ "alpha": alpha, "iterations": iterations, "seconds": minutes * 60.0 }),
        request.driver.clone(),
    )))
}

fn build_hubalign(request: &mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError> {
    let alpha = wrapper_alpha(request, "HubAlign")?;
    // HubAlign's alpha weighs sequence, so it receives the complement.
    Ok(Box::new(KernelMethod::new(
        "hubalign",
        json!({ "alpha": 1.0 - alpha }),
        request.driver.clone(),
    )))
}

fn build_tabu(request: &mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError> {
    request.calibrator.update_objective(
        "tabu",
        &request.pair,
        &request.args.objective,
        request.objective,
    )?;
    let args = request.args;
    let parameters = json!({
        "minutes": MethodArgs::require(args.minutes, "minutes")?,
        "ntabus": MethodArgs::require(args.ntabus, "ntabus")?,
        "nneighbors": MethodArgs::require(args.nneighbors, "nneighbors")?,
        "node_tabus": args.node_tabus,
    });
    Ok(Box::new(KernelMethod::new(
        "tabu",
        parameters,
        request.driver.clone(),
    )))
}

fn build_sana(request: &mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError> {
    request.calibrator.update_objective(
        "sana",
        &request.pair,
        &request.args.objective,
        request.objective,
    )?;
    let args = request.args;
    let t_initial = args
        .t_initial
        .as_ref()
        .ok_or_else(|| AlignError::missing_field("t_initial"))?
        .resolve("t_initial")?;
    let t_decay = args
        .t_decay
        .as_ref()
        .ok_or_else(|| AlignError::missing_field("t_decay"))?
        .resolve("t_decay")?;
    let minutes = MethodArgs::require(args.minutes, "minutes")?;
    let fixed = |schedule: Schedule| match schedule {
        Schedule::Fixed(value) => Some(value),
        Schedule::Auto => None,
    };

    let mut method: Box<dyn Method> = Box::new(Annealing::new(
        fixed(t_initial),
        fixed(t_decay),
        minutes,
        request.driver.clone(),
    ));
    let control = method.as_annealing().ok_or_else(|| {
        AlignError::Config(ErrorInfo::new(
            "method-capability",
            "sana constructor produced a method without annealing controls",
        ))
    })?;
    if args.restart {
        control.enable_restart_scheme(args.restart_scheme()?)?;
    }
    if t_initial == Schedule::Auto {
        control.set_initial_temperature_automatically()?;
    }
    if t_decay == Schedule::Auto {
        control.set_decay_automatically()?;
    }
    Ok(method)
}

fn build_hill_climbing(request: &mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError> {
    let parameters = json!({ "start_alignment": path_value(&request.args.start_alignment) });
    Ok(Box::new(KernelMethod::new(
        "hc",
        parameters,
        request.driver.clone(),
    )))
}

fn build_random(request: &mut MethodRequest<'_>) -> Result<Box<dyn Method>, AlignError> {
    Ok(Box::new(RandomAligner::new(request.args.seed.unwrap_or(0))))
}
