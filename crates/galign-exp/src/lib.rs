#![deny(missing_docs)]
#![doc = "Experiment, calibration and parameter sweep orchestration for graph alignment methods."]

/// Score cube collection across measures, methods and graph pairs.
pub mod experiment;
/// Canonical hashing helpers.
pub mod hash;
/// Measure resolution for graph pairs.
pub mod measures;
/// Method registry and factory.
pub mod methods;
/// Alpha derivation and objective reweighting.
pub mod objective;
/// Competition ranking.
pub mod ranking;
/// Text and CSV reports.
pub mod report;
/// Cluster submission.
pub mod scheduler;
/// Baseline score tables.
pub mod score_table;
/// Canonical JSON and YAML serde helpers.
pub mod serde;
/// Two parameter grid sweeps.
pub mod sweep;

pub use experiment::{
    AlignmentLayout, CellFiles, CollectionSummary, DataCube, ExperimentRunner, ExperimentSpec,
};
pub use hash::stable_hash_string;
pub use measures::{BuiltinMeasures, KernelTerm, MeasureProvider};
pub use methods::{
    CommandDriver, MethodArgs, MethodFactory, MethodRegistry, MethodRequest, SearchDriver,
    SearchRequest,
};
pub use objective::{
    beta_normalized_alpha, AlphaParams, ObjectiveArgs, ObjectiveCalibrator, ObjectiveMode,
};
pub use ranking::{rank_row, scores_to_rankings};
pub use report::{format_value, ScoreGrid, PRECISION_DECIMALS};
pub use scheduler::{ClusterScheduler, CommandScheduler};
pub use score_table::{
    BaselineLookup, BaselineScores, LazyScoreTable, ScoreTable, ScoreTableEntry,
    DEFAULT_SCORE_TABLE,
};
pub use sweep::{
    GridPoint, ParameterSweep, PointState, SweepGrid, SweepManifest, SweepPlan, SweepSummary,
};

pub use crate::serde::{from_json_slice, from_yaml_slice, to_canonical_json_bytes};
