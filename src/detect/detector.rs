//! The contract every violation detector satisfies.

use std::path::PathBuf;
use thiserror::Error;

use super::Violation;

/// Why a detector could not produce results.
#[derive(Error, Debug)]
pub enum DetectorFailure {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("report {} was not produced", .0.display())]
    MissingReport(PathBuf),
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed report {}: {reason}", path.display())]
    MalformedReport { path: PathBuf, reason: String },
    #[error("walking project tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// The underlying analysis tool could not run at all.
///
/// Finding zero violations is a successful outcome and never produces this.
#[derive(Error, Debug)]
#[error("detector `{detector}` failed: {failure}")]
pub struct DetectorExecutionError {
    pub detector: String,
    #[source]
    pub failure: DetectorFailure,
}

impl DetectorExecutionError {
    pub fn new(detector: impl Into<String>, failure: DetectorFailure) -> Self {
        Self {
            detector: detector.into(),
            failure,
        }
    }
}

/// A pluggable analysis adapter producing violations from one tool.
///
/// Detectors come in two shapes. Single-phase detectors compute their results
/// inside [`detected_violations`](Self::detected_violations). Two-phase
/// detectors report `true` from
/// [`needs_explicit_execution`](Self::needs_explicit_execution) and must have
/// [`execute_reporter`](Self::execute_reporter) called exactly once per run
/// before their results are read. Reading results without executing first
/// returns whatever the tool left behind from a previous run.
pub trait ViolationDetector {
    /// Stable identifier, used in logs and as each violation's source.
    fn name(&self) -> &str;

    /// Pure function of configuration. Checked before any tool runs.
    fn is_enabled(&self) -> bool;

    fn needs_explicit_execution(&self) -> bool {
        false
    }

    /// Run the external tool. Only meaningful for two-phase detectors.
    fn execute_reporter(&mut self) -> Result<(), DetectorExecutionError> {
        Ok(())
    }

    fn detected_violations(&mut self) -> Result<Vec<Violation>, DetectorExecutionError>;
}
