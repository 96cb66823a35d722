//! Alpha derivation and objective reweighting.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use galign_core::errors::{AlignError, ErrorInfo};
use galign_core::{MeasureCombination, NetworkPair};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::score_table::{BaselineLookup, BaselineScores};

/// Topology measures the beta baselines are normally measured with.
pub const KNOWN_TOPOLOGY_MEASURES: [&str; 3] = ["ec", "s3", "wec"];

/// How the structural/sequence tradeoff is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveMode {
    /// Weights are used as configured.
    Generic,
    /// Alpha is given directly.
    Alpha,
    /// Alpha is derived from beta and the baseline score table.
    Beta,
}

impl FromStr for ObjectiveMode {
    type Err = AlignError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "generic" => Ok(ObjectiveMode::Generic),
            "alpha" => Ok(ObjectiveMode::Alpha),
            "beta" => Ok(ObjectiveMode::Beta),
            other => Err(AlignError::invalid_value(
                "objfuntype",
                other,
                "unknown objective function type",
            )),
        }
    }
}

impl fmt::Display for ObjectiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObjectiveMode::Generic => "generic",
            ObjectiveMode::Alpha => "alpha",
            ObjectiveMode::Beta => "beta",
        };
        f.write_str(label)
    }
}

/// Objective fields of a method configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ObjectiveArgs {
    /// `generic`, `alpha` or `beta`; absent means `generic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objfuntype: Option<String>,
    /// Direct tradeoff weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    /// Interpretable tradeoff normalised through the score table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    /// Topology measure receiving weight alpha.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_measure: Option<String>,
}

impl ObjectiveArgs {
    /// Parsed objective mode.
    pub fn mode(&self) -> Result<ObjectiveMode, AlignError> {
        match self.objfuntype.as_deref() {
            None => Ok(ObjectiveMode::Generic),
            Some(value) => value.parse(),
        }
    }
}

/// Inputs to [`ObjectiveCalibrator::derive_alpha`].
#[derive(Debug, Clone, Copy)]
pub struct AlphaParams<'a> {
    /// Direct alpha, used in alpha mode.
    pub alpha: Option<f64>,
    /// Beta, used in beta mode.
    pub beta: Option<f64>,
    /// Score table method key, possibly suffixed with the topology measure.
    pub method_key: &'a str,
    /// Graph pair the baselines were measured on.
    pub pair: &'a NetworkPair,
}

/// Beta normalisation: `beta*top / (beta*top + (1-beta)*seq)`.
pub fn beta_normalized_alpha(beta: f64, baselines: BaselineScores) -> Result<f64, AlignError> {
    let top_factor = beta * baselines.topology;
    let seq_factor = (1.0 - beta) * baselines.sequence;
    let denominator = top_factor + seq_factor;
    if denominator == 0.0 {
        return Err(AlignError::DivisionUndefined(
            ErrorInfo::new(
                "beta-zero-denominator",
                "beta normalisation denominator is zero",
            )
            .with_context("beta", beta.to_string())
            .with_context("topology", baselines.topology.to_string())
            .with_context("sequence", baselines.sequence.to_string()),
        ));
    }
    Ok(top_factor / denominator)
}

/// Turns a tradeoff parameter into objective weights.
#[derive(Clone)]
pub struct ObjectiveCalibrator {
    baselines: Arc<dyn BaselineLookup>,
}

impl fmt::Debug for ObjectiveCalibrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectiveCalibrator").finish_non_exhaustive()
    }
}

impl ObjectiveCalibrator {
    /// Creates a calibrator reading baselines from `baselines`.
    pub fn new(baselines: Arc<dyn BaselineLookup>) -> Self {
        Self { baselines }
    }

    /// Alpha for `beta` using the baselines of `method_key` on `pair`.
    pub fn beta_derived_alpha(
        &self,
        method_key: &str,
        pair: &NetworkPair,
        beta: f64,
    ) -> Result<f64, AlignError> {
        let baselines = self.baselines.lookup(method_key, &pair.g1, &pair.g2)?;
        beta_normalized_alpha(beta, baselines).map_err(|err| match err {
            AlignError::DivisionUndefined(info) => AlignError::DivisionUndefined(
                info.with_context("method", method_key)
                    .with_context("g1", pair.g1.clone())
                    .with_context("g2", pair.g2.clone()),
            ),
            other => other,
        })
    }

    /// Derives alpha for the given mode. Direct alphas are passed through
    /// without range checks.
    pub fn derive_alpha(
        &self,
        mode: ObjectiveMode,
        params: &AlphaParams<'_>,
    ) -> Result<f64, AlignError> {
        let result = match mode {
            ObjectiveMode::Alpha => params.alpha.ok_or_else(|| AlignError::missing_field("alpha")),
            ObjectiveMode::Beta => params
                .beta
                .ok_or_else(|| AlignError::missing_field("beta"))
                .and_then(|beta| self.beta_derived_alpha(params.method_key, params.pair, beta)),
            ObjectiveMode::Generic => Err(AlignError::invalid_value(
                "objfuntype",
                mode.to_string(),
                "generic objectives carry no alpha",
            )),
        };
        result.map_err(|err| {
            error!(%err, method = params.method_key, pair = %params.pair, "alpha derivation aborted");
            err
        })
    }

    /// Gives `topology` weight `alpha`, rescales the rest to `1 - alpha` and
    /// records the resulting weight vector.
    pub fn apply_alpha_weights(
        &self,
        combination: &mut MeasureCombination,
        topology: &str,
        alpha: f64,
    ) -> Result<(), AlignError> {
        combination.rebalance_for_alpha(topology, alpha)?;
        info!(
            topology,
            alpha,
            weights = ?combination.weights(),
            "objective weights updated"
        );
        Ok(())
    }

    /// Applies the objective settings of a search method to `combination`.
    /// Beta baselines are looked up under `method_name + top_measure`.
    pub fn update_objective(
        &self,
        method_name: &str,
        pair: &NetworkPair,
        args: &ObjectiveArgs,
        combination: &mut MeasureCombination,
    ) -> Result<(), AlignError> {
        let mode = args.mode()?;
        if mode != ObjectiveMode::Generic {
            let top_measure = args
                .top_measure
                .as_deref()
                .ok_or_else(|| AlignError::missing_field("top_measure"))?;
            if !KNOWN_TOPOLOGY_MEASURES.contains(&top_measure) {
                warn!(top_measure, "top measure is not one of ec, s3, wec");
            }
            let method_key = format!("{method_name}{top_measure}");
            let alpha = self.derive_alpha(
                mode,
                &AlphaParams {
                    alpha: args.alpha,
                    beta: args.beta,
                    method_key: &method_key,
                    pair,
                },
            )?;
            self.apply_alpha_weights(combination, top_measure, alpha)?;
        }
        info!(
            "=== {} -- optimize: ===\n{}",
            method_name,
            combination.render_weights()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beta_half_weighs_baselines() {
        let alpha = beta_normalized_alpha(
            0.5,
            BaselineScores {
                topology: 0.3,
                sequence: 0.1,
            },
        )
        .unwrap();
        assert!((alpha - 0.75).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_is_reported() {
        let err = beta_normalized_alpha(
            1.0,
            BaselineScores {
                topology: 0.0,
                sequence: 0.4,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AlignError::DivisionUndefined(_)));
    }

    #[test]
    fn unknown_mode_names_value() {
        let err = "gamma".parse::<ObjectiveMode>().unwrap_err();
        assert!(matches!(err, AlignError::Config(_)));
        assert_eq!(err.info().context.get("value").map(String::as_str), Some("gamma"));
    }
}
