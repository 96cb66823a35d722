use std::path::PathBuf;
use std::sync::Arc;

use galign_core::errors::{AlignError, ErrorInfo};
use galign_core::{
    Alignment, AnnealingControl, Budget, Graph, MeasureCombination, Method, RestartScheme,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::driver::{SearchDriver, SearchRequest};

/// Temperature setting as written in a configuration: a number or `"auto"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleSetting {
    /// Explicit numeric value.
    Value(f64),
    /// Marker text; only `auto` or a numeric string is accepted.
    Text(String),
}

/// Resolved temperature setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    /// Self-calibrated once before the search starts.
    Auto,
    /// Fixed value.
    Fixed(f64),
}

impl ScheduleSetting {
    /// Resolves the setting, naming `field` when the text is unusable.
    pub fn resolve(&self, field: &str) -> Result<Schedule, AlignError> {
        match self {
            ScheduleSetting::Value(value) => Ok(Schedule::Fixed(*value)),
            ScheduleSetting::Text(text) if text == "auto" => Ok(Schedule::Auto),
            ScheduleSetting::Text(text) => text.parse::<f64>().map(Schedule::Fixed).map_err(|_| {
                AlignError::invalid_value(field, text.clone(), "expected a number or \"auto\"")
            }),
        }
    }
}

/// Reads a precomputed alignment instead of searching.
#[derive(Debug, Clone)]
pub struct EvaluationOnly {
    path: PathBuf,
}

impl EvaluationOnly {
    /// Evaluates the alignment stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Method for EvaluationOnly {
    fn name(&self) -> &str {
        "none"
    }

    fn parameters(&self) -> Value {
        json!({ "alignment": self.path.display().to_string() })
    }

    fn produce_alignment(
        &mut self,
        _g1: &dyn Graph,
        _g2: &dyn Graph,
        _objective: &MeasureCombination,
        _budget: &Budget,
    ) -> Result<Alignment, AlignError> {
        Alignment::load(&self.path)
    }
}

/// Seeded uniformly random injective alignment.
#[derive(Debug, Clone)]
pub struct RandomAligner {
    seed: u64,
}

impl RandomAligner {
    /// Creates an aligner drawing from `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Method for RandomAligner {
    fn name(&self) -> &str {
        "random"
    }

    fn parameters(&self) -> Value {
        json!({ "seed": self.seed })
    }

    fn produce_alignment(
        &mut self,
        g1: &dyn Graph,
        g2: &dyn Graph,
        _objective: &MeasureCombination,
        _budget: &Budget,
    ) -> Result<Alignment, AlignError> {
        let (n1, n2) = (g1.node_count(), g2.node_count());
        if n1 > n2 {
            return Err(AlignError::Config(
                ErrorInfo::new("random-size", "source graph is larger than target graph")
                    .with_context("g1", g1.name())
                    .with_context("g2", g2.name()),
            ));
        }
        let mut targets: Vec<u32> = (0..n2 as u32).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        targets.shuffle(&mut rng);
        targets.truncate(n1);
        Ok(Alignment::new(targets))
    }
}

/// Method whose search runs in an external kernel (greedy, voter, tabu,
/// hill climbing and the wrapped aligners).
pub struct KernelMethod {
    name: &'static str,
    parameters: Value,
    driver: Arc<dyn SearchDriver>,
}

impl KernelMethod {
    /// Binds resolved parameters to a driver.
    pub fn new(name: &'static str, parameters: Value, driver: Arc<dyn SearchDriver>) -> Self {
        Self {
            name,
            parameters,
            driver,
        }
    }
}

impl Method for KernelMethod {
    fn name(&self) -> &str {
        self.name
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    fn produce_alignment(
        &mut self,
        g1: &dyn Graph,
        g2: &dyn Graph,
        objective: &MeasureCombination,
        budget: &Budget,
    ) -> Result<Alignment, AlignError> {
        let request =
            SearchRequest::new(self.name, self.parameters.clone(), g1, g2, objective, budget);
        self.driver.search(&request)
    }
}

/// Simulated annealing variant with optional restarts and self-calibration.
pub struct Annealing {
    t_initial: Option<f64>,
    t_decay: Option<f64>,
    auto_initial: bool,
    auto_decay: bool,
    minutes: f64,
    restart: Option<RestartScheme>,
    driver: Arc<dyn SearchDriver>,
}

impl Annealing {
    /// Creates the variant; `None` temperatures must be self-calibrated
    /// through [`AnnealingControl`] before the search starts.
    pub fn new(
        t_initial: Option<f64>,
        t_decay: Option<f64>,
        minutes: f64,
        driver: Arc<dyn SearchDriver>,
    ) -> Self {
        Self {
            t_initial,
            t_decay,
            auto_initial: false,
            auto_decay: false,
            minutes,
            restart: None,
            driver,
        }
    }

    fn ensure_calibrated(&self) -> Result<(), AlignError> {
        if self.t_initial.is_none() && !self.auto_initial {
            return Err(AlignError::missing_field("t_initial"));
        }
        if self.t_decay.is_none() && !self.auto_decay {
            return Err(AlignError::missing_field("t_decay"));
        }
        Ok(())
    }
}

fn schedule_value(value: Option<f64>, auto: bool) -> Value {
    match (value, auto) {
        (_, true) => json!("auto"),
        (Some(value), false) => json!(value),
        (None, false) => Value::Null,
    }
}

fn already_set(code: &str, message: &str) -> AlignError {
    AlignError::Config(ErrorInfo::new(code, message).with_context("method", "sana"))
}

impl AnnealingControl for Annealing {
    fn enable_restart_scheme(&mut self, scheme: RestartScheme) -> Result<(), AlignError> {
        if self.restart.is_some() {
            return Err(already_set(
                "annealing-restart-twice",
                "restart scheme can only be enabled once",
            ));
        }
        self.restart = Some(scheme);
        Ok(())
    }

    fn set_initial_temperature_automatically(&mut self) -> Result<(), AlignError> {
        if self.auto_initial {
            return Err(already_set(
                "annealing-auto-twice",
                "initial temperature calibration already requested",
            ));
        }
        if self.t_initial.is_some() {
            return Err(already_set(
                "annealing-auto-conflict",
                "initial temperature is set explicitly",
            ));
        }
        self.auto_initial = true;
        Ok(())
    }

    fn set_decay_automatically(&mut self) -> Result<(), AlignError> {
        if self.auto_decay {
            return Err(already_set(
                "annealing-auto-twice",
                "decay calibration already requested",
            ));
        }
        if self.t_decay.is_some() {
            return Err(already_set(
                "annealing-auto-conflict",
                "decay rate is set explicitly",
            ));
        }
        self.auto_decay = true;
        Ok(())
    }

    fn restart_scheme(&self) -> Option<&RestartScheme> {
        self.restart.as_ref()
    }
}

impl Method for Annealing {
    fn name(&self) -> &str {
        "sana"
    }

    fn parameters(&self) -> Value {
        json!({
            "t_initial": schedule_value(self.t_initial, self.auto_initial),
            "t_decay": schedule_value(self.t_decay, self.auto_decay),
            "minutes": self.minutes,
            "restart": self.restart,
        })
    }

    fn produce_alignment(
        &mut self,
        g1: &dyn Graph,
        g2: &dyn Graph,
        objective: &MeasureCombination,
        budget: &Budget,
    ) -> Result<Alignment, AlignError> {
        self.ensure_calibrated()?;
        let request = SearchRequest::new("sana", self.parameters(), g1, g2, objective, budget);
        self.driver.search(&request)
    }

    fn as_annealing(&mut self) -> Option<&mut dyn AnnealingControl> {
        Some(self)
    }
}
