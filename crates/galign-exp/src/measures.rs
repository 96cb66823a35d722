use std::sync::Arc;

use galign_core::errors::{AlignError, ErrorInfo};
use galign_core::{Alignment, Measure, NetworkPair, NodeCorrectness};

/// Resolves measure names for a graph pair.
pub trait MeasureProvider {
    /// Measure `name` bound to the graphs of `pair`.
    fn measure(&self, pair: &NetworkPair, name: &str) -> Result<Arc<dyn Measure>, AlignError>;
}

/// Measures that need no graph data.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMeasures;

impl MeasureProvider for BuiltinMeasures {
    fn measure(&self, pair: &NetworkPair, name: &str) -> Result<Arc<dyn Measure>, AlignError> {
        match name {
            "nc" => Ok(Arc::new(NodeCorrectness)),
            other => Err(AlignError::Config(
                ErrorInfo::new("measure-unknown", format!("unknown measure: {other}"))
                    .with_context("measure", other)
                    .with_context("pair", pair.label()),
            )),
        }
    }
}

/// Objective term scored inside the search kernel. Only its name and weight
/// are handed over; evaluating it here is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelTerm {
    name: String,
    local: bool,
}

impl KernelTerm {
    /// Global term named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: false,
        }
    }

    /// Node similarity term named `name`, usable by voter methods.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: true,
        }
    }
}

impl Measure for KernelTerm {
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, _alignment: &Alignment) -> Result<f64, AlignError> {
        Err(AlignError::Config(
            ErrorInfo::new("measure-kernel-only", "objective term is scored by the search kernel")
                .with_context("measure", self.name.clone()),
        ))
    }

    fn is_local(&self) -> bool {
        self.local
    }
}
