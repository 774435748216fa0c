//! Violation detectors and their aggregation.

mod aggregate;
mod command;
mod detector;
mod pattern;
mod types;

#[cfg(test)]
pub(crate) mod fakes;

use std::path::Path;

use crate::config::{Config, DetectorConfig};

pub use aggregate::{Aggregation, Aggregator, DetectorCount};
pub use command::CommandDetector;
pub use detector::{DetectorExecutionError, DetectorFailure, ViolationDetector};
pub use pattern::PatternDetector;
pub use types::{InvalidViolation, Severity, Violation, ViolationSet};

/// Build the configured detectors, in configuration order.
///
/// Disabled detectors are built too; the aggregator skips them without
/// running anything. Pattern detectors skip the configured report directory.
pub fn build_detectors(
    config: &Config,
    root: &Path,
) -> anyhow::Result<Vec<Box<dyn ViolationDetector>>> {
    let report_dir = config.report_dir(root);
    config
        .detectors
        .iter()
        .map(|d| -> anyhow::Result<Box<dyn ViolationDetector>> {
            Ok(match d {
                DetectorConfig::Pattern(c) => {
                    Box::new(PatternDetector::from_config(c, root, &report_dir)?)
                }
                DetectorConfig::Command(c) => Box::new(CommandDetector::from_config(c, root)),
            })
        })
        .collect()
}
