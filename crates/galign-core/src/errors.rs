//! Structured error types shared across galign crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`AlignError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (method names, graph names, paths, values).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for alignment experiments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum AlignError {
    /// Bad, missing or unknown configuration value.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Required external file absent at load time.
    #[error("missing file: {0}")]
    MissingFile(ErrorInfo),
    /// No score table row matched the requested key.
    #[error("lookup failed: {0}")]
    LookupNotFound(ErrorInfo),
    /// Beta normalisation hit a zero denominator.
    #[error("division undefined: {0}")]
    DivisionUndefined(ErrorInfo),
    /// Expected alignment output absent during a collection pass.
    #[error("missing result: {0}")]
    MissingResult(ErrorInfo),
    /// Filesystem or process failures other than absence.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Parsing and serialization failures.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl AlignError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            AlignError::Config(info)
            | AlignError::MissingFile(info)
            | AlignError::LookupNotFound(info)
            | AlignError::DivisionUndefined(info)
            | AlignError::MissingResult(info)
            | AlignError::Io(info)
            | AlignError::Serde(info) => info,
        }
    }

    /// Returns true when the error only degrades a single collected cell.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AlignError::MissingResult(_))
    }

    /// Missing configuration field, reported by name.
    pub fn missing_field(field: &str) -> Self {
        AlignError::Config(
            ErrorInfo::new("config-missing-field", format!("missing value for `{field}`"))
                .with_context("field", field),
        )
    }

    /// Configuration field holding a value the caller cannot use.
    pub fn invalid_value(field: &str, value: impl Into<String>, reason: &str) -> Self {
        AlignError::Config(
            ErrorInfo::new("config-invalid-value", reason)
                .with_context("field", field)
                .with_context("value", value),
        )
    }

    /// Required file absent from disk.
    pub fn missing_file(path: &Path) -> Self {
        AlignError::MissingFile(
            ErrorInfo::new("missing-file", format!("couldn't find file {}", path.display()))
                .with_context("path", path.display().to_string()),
        )
    }
}
