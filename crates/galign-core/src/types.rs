use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Graph;

/// Ordered pair of graph identities compared by one experiment row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct NetworkPair {
    /// Name of the source graph.
    pub g1: String,
    /// Name of the target graph.
    pub g2: String,
}

impl NetworkPair {
    /// Creates a pair from the two graph names, preserving order.
    pub fn new(g1: impl Into<String>, g2: impl Into<String>) -> Self {
        Self {
            g1: g1.into(),
            g2: g2.into(),
        }
    }

    /// Label used in report rows and folder names.
    pub fn label(&self) -> String {
        format!("{}-{}", self.g1, self.g2)
    }
}

impl From<(String, String)> for NetworkPair {
    fn from((g1, g2): (String, String)) -> Self {
        Self { g1, g2 }
    }
}

impl From<NetworkPair> for (String, String) {
    fn from(pair: NetworkPair) -> Self {
        (pair.g1, pair.g2)
    }
}

impl fmt::Display for NetworkPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.g1, self.g2)
    }
}

/// Minimal graph handle carrying only the identity and node count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedGraph {
    /// Stable graph identity.
    pub name: String,
    /// Number of nodes in the graph.
    pub nodes: usize,
}

impl NamedGraph {
    /// Creates a new graph handle.
    pub fn new(name: impl Into<String>, nodes: usize) -> Self {
        Self {
            name: name.into(),
            nodes,
        }
    }
}

impl Graph for NamedGraph {
    fn name(&self) -> &str {
        &self.name
    }

    fn node_count(&self) -> usize {
        self.nodes
    }
}

/// Execution budget handed to a method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Budget {
    /// Wall-clock limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Duration>,
    /// Iteration limit for methods that count iterations instead of time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,
}

impl Budget {
    /// Budget expressed in (possibly fractional) minutes.
    pub fn minutes(minutes: f64) -> Self {
        Self {
            time: Some(Duration::from_secs_f64((minutes * 60.0).max(0.0))),
            iterations: None,
        }
    }

    /// Adds an iteration limit to the budget.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(iterations);
        self
    }
}

/// Restart schedule for the annealing variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestartScheme {
    /// Temperature used when re-heating from a checkpoint.
    pub warm_temperature: f64,
    /// Iterations between checkpoints.
    pub iterations_per_step: u64,
    /// Number of candidate alignments retained.
    pub candidates: u32,
    /// Temperature at which candidates are refined.
    pub candidate_temperature: f64,
    /// Final temperature of the schedule.
    pub final_temperature: f64,
}
