//! Weighted measure bundles and the built-in node correctness measure.

use std::fmt;
use std::sync::Arc;

use crate::alignment::Alignment;
use crate::errors::{AlignError, ErrorInfo};
use crate::Measure;

/// Measure paired with its weight inside a [`MeasureCombination`].
#[derive(Clone)]
pub struct WeightedMeasure {
    /// Scoring function.
    pub measure: Arc<dyn Measure>,
    /// Non-negative weight.
    pub weight: f64,
}

impl fmt::Debug for WeightedMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedMeasure")
            .field("measure", &self.measure.name())
            .field("weight", &self.weight)
            .finish()
    }
}

/// Non-negative weighted sum over a fixed set of measures.
///
/// The set of measures is fixed once built; the weight vector only changes
/// through [`MeasureCombination::rebalance_for_alpha`].
#[derive(Debug, Clone, Default)]
pub struct MeasureCombination {
    entries: Vec<WeightedMeasure>,
}

impl MeasureCombination {
    /// Creates an empty combination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a measure, rejecting duplicates and negative weights.
    pub fn add(&mut self, measure: Arc<dyn Measure>, weight: f64) -> Result<(), AlignError> {
        if weight.is_nan() || weight < 0.0 {
            return Err(AlignError::invalid_value(
                measure.name(),
                weight.to_string(),
                "measure weights must be non-negative",
            ));
        }
        if self.position(measure.name()).is_some() {
            return Err(AlignError::Config(
                ErrorInfo::new("objective-duplicate-measure", "measure added twice")
                    .with_context("measure", measure.name()),
            ));
        }
        self.entries.push(WeightedMeasure { measure, weight });
        Ok(())
    }

    /// Builder form of [`MeasureCombination::add`].
    pub fn with_measure(mut self, measure: Arc<dyn Measure>, weight: f64) -> Result<Self, AlignError> {
        self.add(measure, weight)?;
        Ok(self)
    }

    /// Returns the measure registered under `name`.
    pub fn get_measure(&self, name: &str) -> Option<&Arc<dyn Measure>> {
        self.position(name).map(|idx| &self.entries[idx].measure)
    }

    /// Returns the weight registered under `name`.
    pub fn weight(&self, name: &str) -> Option<f64> {
        self.position(name).map(|idx| self.entries[idx].weight)
    }

    /// Weight vector in insertion order.
    pub fn weights(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|entry| (entry.measure.name().to_string(), entry.weight))
            .collect()
    }

    /// Number of measures in the combination.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no measure is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weighted score of the alignment; zero-weight measures are skipped.
    pub fn eval(&self, alignment: &Alignment) -> Result<f64, AlignError> {
        let mut total = 0.0;
        for entry in &self.entries {
            if entry.weight > 0.0 {
                total += entry.weight * entry.measure.eval(alignment)?;
            }
        }
        Ok(total)
    }

    /// Gives `topology` weight `alpha` and rescales every other measure so the
    /// remaining weights sum to `1 - alpha` with unchanged proportions. When
    /// the other weights are all zero they share `1 - alpha` equally.
    pub fn rebalance_for_alpha(&mut self, topology: &str, alpha: f64) -> Result<(), AlignError> {
        let top = self.position(topology).ok_or_else(|| {
            AlignError::Config(
                ErrorInfo::new(
                    "objective-unknown-measure",
                    "topology measure is not part of the objective",
                )
                .with_context("measure", topology),
            )
        })?;
        let others = self.entries.len() - 1;
        let rest: f64 = self
            .entries
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != top)
            .map(|(_, entry)| entry.weight)
            .sum();
        let remaining = 1.0 - alpha;
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if idx == top {
                entry.weight = alpha;
            } else if rest > 0.0 {
                entry.weight = entry.weight / rest * remaining;
            } else {
                entry.weight = remaining / others as f64;
            }
        }
        Ok(())
    }

    /// Renders the weight vector, one `name: weight` line per measure.
    pub fn render_weights(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!("{}: {}\n", entry.measure.name(), entry.weight));
        }
        out
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.measure.name() == name)
    }
}

/// Fraction of source nodes mapped onto the target node with the same index.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeCorrectness;

impl Measure for NodeCorrectness {
    fn name(&self) -> &str {
        "nc"
    }

    fn eval(&self, alignment: &Alignment) -> Result<f64, AlignError> {
        if alignment.is_empty() {
            return Err(AlignError::Serde(ErrorInfo::new(
                "measure-empty-alignment",
                "node correctness is undefined for an empty alignment",
            )));
        }
        let correct = alignment
            .mapping()
            .iter()
            .enumerate()
            .filter(|(source, target)| *source as u32 == **target)
            .count();
        Ok(correct as f64 / alignment.len() as f64)
    }
}
