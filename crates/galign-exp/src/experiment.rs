//! Measures × methods × network pairs score collection.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use galign_core::errors::{AlignError, ErrorInfo};
use galign_core::{Alignment, Measure, NetworkPair};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::measures::MeasureProvider;
use crate::ranking::rank_row;
use crate::report::{render_cube_text, write_cube_csv, write_report};
use crate::serde::from_yaml_slice;

/// Extension of replicate files discovered in folder layout.
pub const ALIGNMENT_EXTENSION: &str = "align";

fn io_error(code: &str, err: impl ToString) -> AlignError {
    AlignError::Io(ErrorInfo::new(code, err.to_string()))
}

/// Alignment files of one (pair, method) cell in explicit layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellFiles {
    /// Single run.
    One(PathBuf),
    /// Replicate runs.
    Many(Vec<PathBuf>),
}

impl CellFiles {
    fn paths(&self) -> Vec<PathBuf> {
        match self {
            CellFiles::One(path) => vec![path.clone()],
            CellFiles::Many(paths) => paths.clone(),
        }
    }
}

/// Where the alignments of each cell live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "kebab-case")]
pub enum AlignmentLayout {
    /// Explicit matrix indexed `[pair][method]`.
    Files {
        /// Files per pair, then per method.
        files: Vec<Vec<CellFiles>>,
    },
    /// One folder per cell at `<root>/<method>/<g1>-<g2>/`, every
    /// `.align` file inside being a replicate.
    Folder {
        /// Root of the folder tree.
        root: PathBuf,
    },
}

/// Parsed experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    /// Optional label used in report headers.
    #[serde(default)]
    pub name: String,
    /// Measure names, in report order.
    pub measures: Vec<String>,
    /// Method names, in report order.
    pub methods: Vec<String>,
    /// Ordered graph pairs.
    pub network_pairs: Vec<NetworkPair>,
    /// Alignment file layout.
    pub alignments: AlignmentLayout,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl ExperimentSpec {
    /// Loads and validates an experiment file.
    pub fn load(path: &Path) -> Result<Self, AlignError> {
        if !path.exists() {
            return Err(AlignError::missing_file(path));
        }
        let bytes = fs::read(path).map_err(|err| io_error("experiment_read", err))?;
        let mut spec: ExperimentSpec = from_yaml_slice(&bytes)?;
        spec.base_dir = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        spec.validate()?;
        Ok(spec)
    }

    /// Checks list contents and the shape of the explicit file matrix.
    pub fn validate(&self) -> Result<(), AlignError> {
        for (field, values) in [("measures", &self.measures), ("methods", &self.methods)] {
            if values.is_empty() {
                return Err(AlignError::missing_field(field));
            }
            let mut seen = BTreeSet::new();
            for value in values {
                if !seen.insert(value) {
                    return Err(AlignError::invalid_value(field, value.clone(), "listed twice"));
                }
            }
        }
        if self.network_pairs.is_empty() {
            return Err(AlignError::missing_field("network_pairs"));
        }
        if let AlignmentLayout::Files { files } = &self.alignments {
            if files.len() != self.network_pairs.len() {
                return Err(AlignError::Config(
                    ErrorInfo::new("experiment-files-rows", "one file row is needed per pair")
                        .with_context("pairs", self.network_pairs.len().to_string())
                        .with_context("rows", files.len().to_string()),
                ));
            }
            for (pair, row) in self.network_pairs.iter().zip(files) {
                if row.len() != self.methods.len() {
                    return Err(AlignError::Config(
                        ErrorInfo::new(
                            "experiment-files-columns",
                            "one file entry is needed per method",
                        )
                        .with_context("pair", pair.label())
                        .with_context("methods", self.methods.len().to_string())
                        .with_context("entries", row.len().to_string()),
                    ));
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Replicate alignment paths of a cell. Any absent file, or a folder
    /// without replicates, is a [`AlignError::MissingResult`].
    pub fn replicate_paths(&self, method: usize, pair: usize) -> Result<Vec<PathBuf>, AlignError> {
        let method_name = &self.methods[method];
        let network_pair = &self.network_pairs[pair];
        let missing = |message: &str, path: &Path| {
            AlignError::MissingResult(
                ErrorInfo::new("experiment-missing-result", message)
                    .with_context("method", method_name.clone())
                    .with_context("pair", network_pair.label())
                    .with_context("path", path.display().to_string()),
            )
        };
        match &self.alignments {
            AlignmentLayout::Files { files } => {
                let paths: Vec<PathBuf> = files[pair][method]
                    .paths()
                    .iter()
                    .map(|path| self.resolve(path))
                    .collect();
                if let Some(absent) = paths.iter().find(|path| !path.exists()) {
                    return Err(missing("alignment file not found", absent.as_path()));
                }
                if paths.is_empty() {
                    return Err(missing("no alignment file configured", self.base_dir.as_path()));
                }
                Ok(paths)
            }
            AlignmentLayout::Folder { root } => {
                let folder = self
                    .resolve(root)
                    .join(method_name)
                    .join(network_pair.label());
                if !folder.is_dir() {
                    return Err(missing("replicate folder not found", folder.as_path()));
                }
                let paths: Vec<PathBuf> = WalkDir::new(&folder)
                    .min_depth(1)
                    .max_depth(1)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|path| {
                        path.extension().and_then(|ext| ext.to_str()) == Some(ALIGNMENT_EXTENSION)
                    })
                    .collect();
                if paths.is_empty() {
                    return Err(missing("replicate folder holds no alignments", folder.as_path()));
                }
                Ok(paths)
            }
        }
    }
}

/// Scores indexed `[measure][method][pair]`; `None` marks an unresolved cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCube {
    measures: Vec<String>,
    methods: Vec<String>,
    pairs: Vec<NetworkPair>,
    values: Vec<Option<f64>>,
    ranked: bool,
}

impl DataCube {
    /// Cube with every cell unresolved.
    pub fn new(measures: Vec<String>, methods: Vec<String>, pairs: Vec<NetworkPair>) -> Self {
        let cells = measures.len() * methods.len() * pairs.len();
        Self {
            measures,
            methods,
            pairs,
            values: vec![None; cells],
            ranked: false,
        }
    }

    fn index(&self, measure: usize, method: usize, pair: usize) -> usize {
        (measure * self.methods.len() + method) * self.pairs.len() + pair
    }

    /// Measure axis.
    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    /// Method axis.
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Pair axis.
    pub fn pairs(&self) -> &[NetworkPair] {
        &self.pairs
    }

    /// True once the cube holds ranks instead of scores.
    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    /// Value of a cell.
    pub fn get(&self, measure: usize, method: usize, pair: usize) -> Option<f64> {
        self.values[self.index(measure, method, pair)]
    }

    /// Writes a cell.
    pub fn set(&mut self, measure: usize, method: usize, pair: usize, value: f64) {
        let idx = self.index(measure, method, pair);
        self.values[idx] = Some(value);
    }

    /// Values of all methods for one measure and pair.
    pub fn row(&self, measure: usize, pair: usize) -> Vec<Option<f64>> {
        (0..self.methods.len())
            .map(|method| self.get(measure, method, pair))
            .collect()
    }

    /// Replaces every (measure, pair) row by its competition ranks.
    pub fn rank_in_place(&mut self) {
        if self.ranked {
            return;
        }
        for measure in 0..self.measures.len() {
            for pair in 0..self.pairs.len() {
                let ranks = rank_row(&self.row(measure, pair));
                for (method, rank) in ranks.into_iter().enumerate() {
                    let idx = self.index(measure, method, pair);
                    self.values[idx] = rank.map(|rank| rank as f64);
                }
            }
        }
        self.ranked = true;
    }

    /// Copy of the cube transformed to ranks.
    pub fn rankings(&self) -> DataCube {
        let mut ranked = self.clone();
        ranked.rank_in_place();
        ranked
    }

    /// Mean rank of each method for one measure over the pairs where it was ranked.
    pub fn mean_ranks(&self, measure: usize) -> Vec<Option<f64>> {
        let ranked = self.rankings();
        (0..self.methods.len())
            .map(|method| {
                let ranks: Vec<f64> = (0..self.pairs.len())
                    .filter_map(|pair| ranked.get(measure, method, pair))
                    .collect();
                if ranks.is_empty() {
                    None
                } else {
                    Some(ranks.iter().sum::<f64>() / ranks.len() as f64)
                }
            })
            .collect()
    }
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CollectionSummary {
    /// Cells holding a score.
    pub resolved: usize,
    /// Cells left unresolved.
    pub unresolved: usize,
    /// One entry per unresolved cell.
    pub missing: Vec<AlignError>,
}

/// Builds the score cube of an experiment and renders its reports.
pub struct ExperimentRunner<'a> {
    spec: ExperimentSpec,
    measures: &'a dyn MeasureProvider,
    cube: DataCube,
}

impl<'a> ExperimentRunner<'a> {
    /// Creates a runner with an all-unresolved cube.
    pub fn new(spec: ExperimentSpec, measures: &'a dyn MeasureProvider) -> Result<Self, AlignError> {
        spec.validate()?;
        let cube = DataCube::new(
            spec.measures.clone(),
            spec.methods.clone(),
            spec.network_pairs.clone(),
        );
        Ok(Self {
            spec,
            measures,
            cube,
        })
    }

    /// Experiment configuration.
    pub fn spec(&self) -> &ExperimentSpec {
        &self.spec
    }

    /// Scores gathered by the last collection pass.
    pub fn cube(&self) -> &DataCube {
        &self.cube
    }

    /// Evaluates every cell, measure by method by pair. Missing or unreadable
    /// alignments leave their cell unresolved; the pass continues.
    pub fn collect_data(&mut self) -> Result<CollectionSummary, AlignError> {
        let mut cube = DataCube::new(
            self.spec.measures.clone(),
            self.spec.methods.clone(),
            self.spec.network_pairs.clone(),
        );
        let mut summary = CollectionSummary::default();
        let mut bound: BTreeMap<(usize, usize), Arc<dyn Measure>> = BTreeMap::new();

        for (mi, measure_name) in self.spec.measures.iter().enumerate() {
            for (ki, method) in self.spec.methods.iter().enumerate() {
                for (pi, pair) in self.spec.network_pairs.iter().enumerate() {
                    let paths = match self.spec.replicate_paths(ki, pi) {
                        Ok(paths) => paths,
                        Err(err) if err.is_recoverable() => {
                            warn!(measure = %measure_name, method = %method, pair = %pair, %err, "cell unresolved");
                            summary.unresolved += 1;
                            summary.missing.push(err);
                            continue;
                        }
                        Err(err) => return Err(err),
                    };
                    let measure = match bound.get(&(mi, pi)) {
                        Some(measure) => measure.clone(),
                        None => {
                            let measure = self.measures.measure(pair, measure_name)?;
                            bound.insert((mi, pi), measure.clone());
                            measure
                        }
                    };
                    let mut total = 0.0;
                    let mut unreadable = None;
                    for path in &paths {
                        match Alignment::load(path) {
                            Ok(alignment) => total += measure.eval(&alignment)?,
                            Err(err @ AlignError::Serde(_)) => {
                                unreadable = Some(err);
                                break;
                            }
                            Err(err) => return Err(err),
                        }
                    }
                    if let Some(err) = unreadable {
                        warn!(measure = %measure_name, method = %method, pair = %pair, %err, "replicate not readable yet");
                        summary.unresolved += 1;
                        summary.missing.push(err);
                        continue;
                    }
                    let score = total / paths.len() as f64;
                    debug!(measure = %measure_name, method = %method, pair = %pair, replicates = paths.len(), score, "cell resolved");
                    cube.set(mi, ki, pi, score);
                    summary.resolved += 1;
                }
            }
        }

        info!(
            resolved = summary.resolved,
            unresolved = summary.unresolved,
            "experiment collection pass finished"
        );
        self.cube = cube;
        Ok(summary)
    }

    /// Plain-text report: score and rank blocks per measure.
    pub fn render_text(&self) -> String {
        render_cube_text(&self.spec.name, &self.cube)
    }

    /// Writes the plain-text report.
    pub fn print_data(&self, path: &Path) -> Result<(), AlignError> {
        write_report(path, &self.render_text())
    }

    /// Writes the CSV report.
    pub fn print_data_csv(&self, path: &Path) -> Result<(), AlignError> {
        write_cube_csv(path, &self.cube)
    }
}
