//! Empirical baseline scores keyed by (method, G1, G2).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use galign_core::errors::{AlignError, ErrorInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File name the command line tools look for when no table is given.
pub const DEFAULT_SCORE_TABLE: &str = "topologySequenceScoreTable.cnf";

/// Topology and sequence baselines measured for one method on one graph pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineScores {
    /// Score reached when optimising topology only.
    pub topology: f64,
    /// Score reached when optimising sequence similarity only.
    pub sequence: f64,
}

/// One row of the score table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTableEntry {
    /// Method identity key, e.g. `lgraal` or `sanaec`.
    pub method: String,
    /// Name of the first graph.
    pub g1: String,
    /// Name of the second graph.
    pub g2: String,
    /// Topology baseline.
    pub topology: f64,
    /// Sequence baseline.
    pub sequence: f64,
}

/// Read-only access to baseline scores.
pub trait BaselineLookup: Send + Sync {
    /// Returns the baselines of the unique row matching all three keys.
    fn lookup(&self, method: &str, g1: &str, g2: &str) -> Result<BaselineScores, AlignError>;
}

type RowKey = (String, String, String);

/// Score table held fully in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    source: String,
    rows: BTreeMap<RowKey, BaselineScores>,
}

impl ScoreTable {
    /// Loads the table from disk.
    pub fn load(path: &Path) -> Result<Self, AlignError> {
        if !path.exists() {
            return Err(AlignError::missing_file(path));
        }
        let text = fs::read_to_string(path).map_err(|err| {
            AlignError::Io(
                ErrorInfo::new("score-table-read", "failed to read score table")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        let table = Self::parse(&text, &path.display().to_string())?;
        debug!(path = %path.display(), rows = table.len(), "loaded score table");
        Ok(table)
    }

    /// Parses whitespace separated `method g1 g2 topology sequence` rows.
    /// Blank lines and lines starting with `#` are ignored.
    pub fn parse(text: &str, source: &str) -> Result<Self, AlignError> {
        let mut entries = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            let line_no = (idx + 1).to_string();
            if fields.len() < 5 {
                return Err(AlignError::Config(
                    ErrorInfo::new("score-table-row", "score table row needs five fields")
                        .with_context("source", source)
                        .with_context("line", line_no),
                ));
            }
            let number = |field: &str, column: &str| {
                field.parse::<f64>().map_err(|err| {
                    AlignError::Config(
                        ErrorInfo::new("score-table-number", "score table value is not numeric")
                            .with_context("source", source)
                            .with_context("line", line_no.clone())
                            .with_context("column", column)
                            .with_hint(err.to_string()),
                    )
                })
            };
            entries.push(ScoreTableEntry {
                method: fields[0].to_string(),
                g1: fields[1].to_string(),
                g2: fields[2].to_string(),
                topology: number(fields[3], "topology")?,
                sequence: number(fields[4], "sequence")?,
            });
        }
        Self::from_entries(source, entries)
    }

    /// Builds a table from explicit rows; duplicate keys are rejected.
    pub fn from_entries(
        source: &str,
        entries: impl IntoIterator<Item = ScoreTableEntry>,
    ) -> Result<Self, AlignError> {
        let mut rows = BTreeMap::new();
        for entry in entries {
            let key = (entry.method, entry.g1, entry.g2);
            let scores = BaselineScores {
                topology: entry.topology,
                sequence: entry.sequence,
            };
            if rows.contains_key(&key) {
                let (method, g1, g2) = key;
                return Err(AlignError::Config(
                    ErrorInfo::new("score-table-duplicate", "score table key appears twice")
                        .with_context("source", source)
                        .with_context("method", method)
                        .with_context("g1", g1)
                        .with_context("g2", g2),
                ));
            }
            rows.insert(key, scores);
        }
        Ok(Self {
            source: source.to_string(),
            rows,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl BaselineLookup for ScoreTable {
    fn lookup(&self, method: &str, g1: &str, g2: &str) -> Result<BaselineScores, AlignError> {
        let key = (method.to_string(), g1.to_string(), g2.to_string());
        self.rows.get(&key).copied().ok_or_else(|| {
            AlignError::LookupNotFound(
                ErrorInfo::new(
                    "score-table-lookup",
                    format!(
                        "couldn't find entry in {} for {} {} {}",
                        self.source, method, g1, g2
                    ),
                )
                .with_context("method", method)
                .with_context("g1", g1)
                .with_context("g2", g2),
            )
        })
    }
}

/// Score table read from disk on first lookup and cached afterwards.
#[derive(Debug)]
pub struct LazyScoreTable {
    path: PathBuf,
    table: OnceLock<ScoreTable>,
}

impl LazyScoreTable {
    /// Defers loading `path` until the first lookup.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceLock::new(),
        }
    }

    /// Returns true once the file has been read.
    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    fn table(&self) -> Result<&ScoreTable, AlignError> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let loaded = ScoreTable::load(&self.path)?;
        Ok(self.table.get_or_init(|| loaded))
    }
}

impl BaselineLookup for LazyScoreTable {
    fn lookup(&self, method: &str, g1: &str, g2: &str) -> Result<BaselineScores, AlignError> {
        self.table()?.lookup(method, g1, g2)
    }
}
