#![deny(missing_docs)]
#![doc = "Core traits and data types shared by the graph alignment experiment crates."]

use serde_json::Value;

pub mod alignment;
pub mod errors;
pub mod measure;
mod types;

pub use alignment::Alignment;
pub use errors::{AlignError, ErrorInfo};
pub use measure::{MeasureCombination, NodeCorrectness, WeightedMeasure};
pub use types::{Budget, NamedGraph, NetworkPair, RestartScheme};

/// Identity contract for graphs; structure is owned by the graph library.
pub trait Graph: Send + Sync {
    /// Stable graph name used in score tables and file layouts.
    fn name(&self) -> &str;

    /// Number of nodes in the graph.
    fn node_count(&self) -> usize;
}

/// Named scoring function over an alignment of a fixed graph pair.
pub trait Measure: Send + Sync {
    /// Name under which the measure is configured.
    fn name(&self) -> &str;

    /// Scores the alignment.
    fn eval(&self, alignment: &Alignment) -> Result<f64, AlignError>;

    /// Returns true for node-similarity measures usable by voter methods.
    fn is_local(&self) -> bool {
        false
    }
}

/// Alignment procedure produced by the method factory.
pub trait Method: Send {
    /// Registered method name.
    fn name(&self) -> &str;

    /// Resolved method parameters, for reports and external drivers.
    fn parameters(&self) -> Value;

    /// Runs the method and returns the resulting alignment.
    fn produce_alignment(
        &mut self,
        g1: &dyn Graph,
        g2: &dyn Graph,
        objective: &MeasureCombination,
        budget: &Budget,
    ) -> Result<Alignment, AlignError>;

    /// Annealing controls, available only on the annealing variant.
    fn as_annealing(&mut self) -> Option<&mut dyn AnnealingControl> {
        None
    }
}

/// One-shot configuration hooks of the annealing variant.
pub trait AnnealingControl {
    /// Enables the restart schedule; a second call is a configuration error.
    fn enable_restart_scheme(&mut self, scheme: RestartScheme) -> Result<(), AlignError>;

    /// Requests self-calibration of the initial temperature before the search starts.
    fn set_initial_temperature_automatically(&mut self) -> Result<(), AlignError>;

    /// Requests self-calibration of the decay rate before the search starts.
    fn set_decay_automatically(&mut self) -> Result<(), AlignError>;

    /// Restart schedule currently enabled, if any.
    fn restart_scheme(&self) -> Option<&RestartScheme>;
}
