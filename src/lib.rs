//! Lintgate - static-analysis quality gate.
//!
//! Lintgate runs a configurable set of violation detectors against a project,
//! merges their findings into one deduplicated set, renders an HTML report
//! and decides the build status.
//!
//! # Architecture
//!
//! - `detect`: the detector contract, built-in detectors and the aggregator
//! - `status`: turns a violation set and policy into pass / stop / fail
//! - `report`: HTML report rendering and console output (pretty, JSON)
//! - `sink`: persists the rendered report
//! - `check`: sequences aggregation, rendering, persistence and decision
//! - `config`: YAML configuration schema
//!
//! # Adding a New Detector
//!
//! Implement `ViolationDetector`. Detectors that must run an external tool
//! before their results can be read return `true` from
//! `needs_explicit_execution` and do the work in `execute_reporter`.

pub mod check;
pub mod cli;
pub mod config;
pub mod detect;
pub mod report;
pub mod sink;
pub mod status;

pub use check::{CheckError, CheckOrchestrator, CheckRun, CheckStatus};
pub use config::{Config, Policy};
pub use detect::{
    Aggregation, Aggregator, DetectorExecutionError, Severity, Violation, ViolationDetector,
    ViolationSet,
};
pub use sink::{ArtifactSink, ArtifactWriteError, FsArtifactSink};
pub use status::{CheckOutcome, Decision, ScheduledTasks, TaskGraph};
