//! Cluster submission seam.

use std::path::Path;
use std::process::Command;

use galign_core::errors::{AlignError, ErrorInfo};
use tracing::info;

/// Hands a run script to a batch system. Implementations return as soon as
/// the submission itself is accepted and never wait for the job.
pub trait ClusterScheduler {
    /// Submits `script`; failure means the submission was rejected.
    fn submit(&self, script: &Path) -> Result<(), AlignError>;
}

/// Submits through an external command such as `qsub <script>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandScheduler {
    program: String,
    args: Vec<String>,
}

impl CommandScheduler {
    /// Program used when none is configured.
    pub const DEFAULT_PROGRAM: &'static str = "qsub";

    /// Scheduler running `program [args...] <script>`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Submission program.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM, Vec::new())
    }
}

impl ClusterScheduler for CommandScheduler {
    fn submit(&self, script: &Path) -> Result<(), AlignError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(script)
            .status()
            .map_err(|err| {
                AlignError::Io(
                    ErrorInfo::new("scheduler-spawn", err.to_string())
                        .with_context("program", self.program.clone())
                        .with_context("script", script.display().to_string()),
                )
            })?;
        if !status.success() {
            return Err(AlignError::Io(
                ErrorInfo::new("scheduler-rejected", "submission command failed")
                    .with_context("program", self.program.clone())
                    .with_context("script", script.display().to_string())
                    .with_context("status", status.to_string()),
            ));
        }
        info!(program = %self.program, script = %script.display(), "script submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_program_is_qsub() {
        assert_eq!(CommandScheduler::default().program(), "qsub");
    }

    #[test]
    fn unknown_program_is_io_error() {
        let scheduler = CommandScheduler::new("galign-no-such-submitter", Vec::new());
        let err = scheduler.submit(Path::new("run.sh")).unwrap_err();
        assert_eq!(err.info().code, "scheduler-spawn");
    }
}
