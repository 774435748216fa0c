//! Check orchestration: aggregate, render, persist, decide.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::Policy;
use crate::detect::{Aggregation, Aggregator, DetectorExecutionError};
use crate::report;
use crate::sink::{ArtifactSink, ArtifactWriteError};
use crate::status::{self, CheckOutcome, TaskGraph};

/// Everything a finished check run produced.
#[derive(Debug, Clone)]
pub struct CheckRun {
    pub aggregation: Aggregation,
    pub outcome: CheckOutcome,
    pub report_path: PathBuf,
}

impl CheckRun {
    /// Explanation shown when violations stop or fail the build.
    pub fn failure_message(&self) -> String {
        format!(
            "One or more violation detectors has found violations. Check the report at {} for details.",
            self.report_path.display()
        )
    }
}

/// How a check ended, short of a hard failure.
#[derive(Debug)]
pub enum CheckStatus {
    /// The global switch is off; nothing ran.
    Disabled,
    Passed(CheckRun),
    /// Violations found, but only this check stops. The build may proceed.
    Stopped(CheckRun),
}

/// Errors that abort the build.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error(transparent)]
    Detector(#[from] DetectorExecutionError),
    #[error(transparent)]
    Artifact(#[from] ArtifactWriteError),
    #[error("{}", .0.failure_message())]
    Failed(Box<CheckRun>),
}

/// Sequences one check run against its host environment.
pub struct CheckOrchestrator<'a> {
    policy: &'a Policy,
    aggregator: Aggregator,
    sink: &'a dyn ArtifactSink,
    tasks: &'a dyn TaskGraph,
    report_dir: PathBuf,
}

impl<'a> CheckOrchestrator<'a> {
    pub fn new(
        policy: &'a Policy,
        aggregator: Aggregator,
        sink: &'a dyn ArtifactSink,
        tasks: &'a dyn TaskGraph,
        report_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            policy,
            aggregator,
            sink,
            tasks,
            report_dir: report_dir.into(),
        }
    }

    /// Run the check.
    ///
    /// A detector or report-write failure aborts before any decision is made.
    /// A hard failure decision is returned as [`CheckError::Failed`].
    pub fn run(mut self) -> Result<CheckStatus, CheckError> {
        if !self.policy.enabled {
            tracing::info!("checks disabled, skipping");
            return Ok(CheckStatus::Disabled);
        }

        let aggregation = self.aggregator.run()?;

        let rendered = report::render(&aggregation.violations);
        let report_path = self.sink.write_report(&self.report_dir, &rendered)?;

        let outcome = status::decide(&aggregation.violations, self.policy, self.tasks);
        tracing::debug!(
            decision = %outcome.decision,
            violations = outcome.violation_count,
            "check decided"
        );

        let run = CheckRun {
            aggregation,
            outcome,
            report_path,
        };

        match run.outcome.decision {
            status::Decision::Pass => Ok(CheckStatus::Passed(run)),
            status::Decision::SoftFail => {
                tracing::warn!("{}", run.failure_message());
                Ok(CheckStatus::Stopped(run))
            }
            status::Decision::HardFail => Err(CheckError::Failed(Box::new(run))),
        }
    }
}
