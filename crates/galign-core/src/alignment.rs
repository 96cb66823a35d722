//! Node mappings between two graphs and their on-disk text form.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{AlignError, ErrorInfo};

/// Mapping from source node index to target node index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    mapping: Vec<u32>,
}

impl Alignment {
    /// Wraps an explicit mapping.
    pub fn new(mapping: Vec<u32>) -> Self {
        Self { mapping }
    }

    /// Maps every node onto the node with the same index.
    pub fn identity(nodes: usize) -> Self {
        Self {
            mapping: (0..nodes as u32).collect(),
        }
    }

    /// Returns the target index for each source node.
    pub fn mapping(&self) -> &[u32] {
        &self.mapping
    }

    /// Number of aligned source nodes.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Returns true when the alignment maps no nodes.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Returns true when no two source nodes share a target.
    pub fn is_injective(&self) -> bool {
        let distinct: BTreeSet<_> = self.mapping.iter().collect();
        distinct.len() == self.mapping.len()
    }

    /// Parses whitespace separated target indices.
    pub fn parse(text: &str) -> Result<Self, AlignError> {
        let mut mapping = Vec::new();
        for (position, token) in text.split_whitespace().enumerate() {
            let target = token.parse::<u32>().map_err(|err| {
                AlignError::Serde(
                    ErrorInfo::new("alignment-parse", "alignment entry is not a node index")
                        .with_context("position", position.to_string())
                        .with_context("token", token)
                        .with_hint(err.to_string()),
                )
            })?;
            mapping.push(target);
        }
        if mapping.is_empty() {
            return Err(AlignError::Serde(ErrorInfo::new(
                "alignment-empty",
                "alignment file contains no entries",
            )));
        }
        Ok(Self { mapping })
    }

    /// Loads an alignment from disk; absence is reported as a missing file.
    pub fn load(path: &Path) -> Result<Self, AlignError> {
        if !path.exists() {
            return Err(AlignError::missing_file(path));
        }
        let text = fs::read_to_string(path).map_err(|err| {
            AlignError::Io(
                ErrorInfo::new("alignment-read", "failed to read alignment file")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        Self::parse(&text).map_err(|err| match err {
            AlignError::Serde(info) => {
                AlignError::Serde(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Renders the single-line text form.
    pub fn to_text(&self) -> String {
        let entries: Vec<String> = self.mapping.iter().map(|idx| idx.to_string()).collect();
        format!("{}\n", entries.join(" "))
    }

    /// Writes the alignment to disk, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), AlignError> {
        let io_err = |code: &str, err: std::io::Error| {
            AlignError::Io(
                ErrorInfo::new(code, "failed to write alignment file")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| io_err("alignment-dir", err))?;
        }
        fs::write(path, self.to_text()).map_err(|err| io_err("alignment-write", err))
    }
}
