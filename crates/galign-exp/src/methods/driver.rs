use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use galign_core::errors::{AlignError, ErrorInfo};
use galign_core::{Alignment, Budget, Graph, MeasureCombination};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::serde::to_canonical_json_bytes;

/// Everything a search kernel needs to run one method on one graph pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Registered method name.
    pub method: String,
    /// Name of the source graph.
    pub g1: String,
    /// Name of the target graph.
    pub g2: String,
    /// Node count of the source graph.
    pub g1_nodes: usize,
    /// Node count of the target graph.
    pub g2_nodes: usize,
    /// Method specific parameters.
    pub parameters: Value,
    /// Objective weight vector, empty for methods without an objective.
    pub objective: Vec<(String, f64)>,
    /// Execution budget.
    pub budget: Budget,
}

impl SearchRequest {
    /// Assembles a request from the method's resolved parameters.
    pub fn new(
        method: &str,
        parameters: Value,
        g1: &dyn Graph,
        g2: &dyn Graph,
        objective: &MeasureCombination,
        budget: &Budget,
    ) -> Self {
        Self {
            method: method.to_string(),
            g1: g1.name().to_string(),
            g2: g2.name().to_string(),
            g1_nodes: g1.node_count(),
            g2_nodes: g2.node_count(),
            parameters,
            objective: objective.weights(),
            budget: *budget,
        }
    }

    /// File stem shared by the request and its output, unique per method and pair.
    pub fn stem(&self) -> String {
        format!("{}_{}-{}", self.method, self.g1, self.g2)
    }
}

/// Runs the search kernel behind a method.
pub trait SearchDriver: Send + Sync {
    /// Executes the request and returns the produced alignment.
    fn search(&self, request: &SearchRequest) -> Result<Alignment, AlignError>;
}

/// Hands requests to an external aligner binary.
///
/// The binary is invoked as `<program> --request <json> --out <alignment>`
/// and must write the alignment in the single-line text format.
#[derive(Debug, Clone)]
pub struct CommandDriver {
    program: PathBuf,
    work_dir: PathBuf,
}

impl CommandDriver {
    /// Creates a driver writing requests and outputs under `work_dir`.
    pub fn new(program: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Directory receiving request and alignment files.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

fn io_error(code: &str, path: &Path, err: impl fmt::Display) -> AlignError {
    AlignError::Io(
        ErrorInfo::new(code, "external aligner failure")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

impl SearchDriver for CommandDriver {
    fn search(&self, request: &SearchRequest) -> Result<Alignment, AlignError> {
        fs::create_dir_all(&self.work_dir)
            .map_err(|err| io_error("driver-work-dir", &self.work_dir, err))?;
        let stem = request.stem();
        let request_path = self.work_dir.join(format!("{stem}.request.json"));
        let output_path = self.work_dir.join(format!("{stem}.align"));
        let bytes = to_canonical_json_bytes(request)?;
        fs::write(&request_path, bytes)
            .map_err(|err| io_error("driver-request-write", &request_path, err))?;

        info!(
            method = %request.method,
            program = %self.program.display(),
            "running external aligner"
        );
        let status = Command::new(&self.program)
            .arg("--request")
            .arg(&request_path)
            .arg("--out")
            .arg(&output_path)
            .status()
            .map_err(|err| io_error("driver-spawn", &self.program, err))?;
        if !status.success() {
            return Err(AlignError::Io(
                ErrorInfo::new("driver-exit", "external aligner exited with failure")
                    .with_context("program", self.program.display().to_string())
                    .with_context("status", status.to_string()),
            ));
        }
        Alignment::load(&output_path)
    }
}
