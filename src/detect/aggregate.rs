//! Runs every enabled detector and merges the results.

use serde::Serialize;

use super::{DetectorExecutionError, ViolationDetector, ViolationSet};

/// How many violations one detector reported, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectorCount {
    pub detector: String,
    pub violations: usize,
}

/// Result of one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub violations: ViolationSet,
    /// Raw per-detector counts in execution order. They do not sum to
    /// `violations.len()` when detectors overlap.
    pub counts: Vec<DetectorCount>,
}

/// Executes detectors in order and folds their output into one set.
#[derive(Default)]
pub struct Aggregator {
    detectors: Vec<Box<dyn ViolationDetector>>,
}

impl Aggregator {
    pub fn new(detectors: Vec<Box<dyn ViolationDetector>>) -> Self {
        Self { detectors }
    }

    /// Run all enabled detectors sequentially.
    ///
    /// The first detector failure aborts the run; nothing collected so far is
    /// returned.
    pub fn run(&mut self) -> Result<Aggregation, DetectorExecutionError> {
        let mut aggregation = Aggregation::default();

        for detector in self.detectors.iter_mut() {
            if !detector.is_enabled() {
                tracing::debug!(detector = detector.name(), "detector disabled, skipping");
                continue;
            }

            if detector.needs_explicit_execution() {
                tracing::debug!(detector = detector.name(), "executing reporter");
                detector.execute_reporter()?;
            }

            let detected = detector.detected_violations()?;
            tracing::info!(
                detector = detector.name(),
                count = detected.len(),
                "{} detected {} violations.",
                detector.name(),
                detected.len()
            );

            aggregation.counts.push(DetectorCount {
                detector: detector.name().to_string(),
                violations: detected.len(),
            });
            aggregation.violations.extend(detected);
        }

        Ok(aggregation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::fakes::{FailingDetector, FixedDetector, TwoPhaseDetector};
    use crate::detect::{Severity, Violation};

    fn violation(detector: &str, file: &str, line: usize) -> Violation {
        Violation::new(detector, file, line, "X", "Y", Severity::Warning).unwrap()
    }

    #[test]
    fn test_dedup_across_detectors() {
        let mut aggregator = Aggregator::new(vec![
            Box::new(FixedDetector::new("pmd", vec![violation("pmd", "foo.go", 10)])),
            Box::new(FixedDetector::new(
                "checkstyle",
                vec![violation("checkstyle", "foo.go", 10)],
            )),
        ]);

        let result = aggregator.run().unwrap();

        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.counts,
            vec![
                DetectorCount {
                    detector: "pmd".to_string(),
                    violations: 1
                },
                DetectorCount {
                    detector: "checkstyle".to_string(),
                    violations: 1
                },
            ]
        );
    }

    #[test]
    fn test_disabled_detector_is_never_invoked() {
        let disabled = FixedDetector::new("lint", vec![violation("lint", "a.rs", 1)]).disabled();
        let calls = disabled.calls();
        let mut aggregator = Aggregator::new(vec![Box::new(disabled)]);

        let result = aggregator.run().unwrap();

        assert!(result.violations.is_empty());
        assert!(result.counts.is_empty());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_adding_disabled_detector_changes_nothing() {
        let base = || FixedDetector::new("pmd", vec![violation("pmd", "a.rs", 1)]);
        let extra = || FixedDetector::new("lint", vec![violation("lint", "b.rs", 2)]);

        let without = Aggregator::new(vec![Box::new(base())]).run().unwrap();
        let with_disabled = Aggregator::new(vec![Box::new(base()), Box::new(extra().disabled())])
            .run()
            .unwrap();
        let with_enabled = Aggregator::new(vec![Box::new(base()), Box::new(extra())])
            .run()
            .unwrap();

        let ids = |a: &Aggregation| a.violations.iter().cloned().collect::<Vec<_>>();
        assert_eq!(ids(&without), ids(&with_disabled));
        assert!(ids(&without)
            .iter()
            .all(|v| with_enabled.violations.contains(v)));
        assert_eq!(with_enabled.violations.len(), 2);
    }

    #[test]
    fn test_two_phase_detector_executes_once_before_reading() {
        let detector = TwoPhaseDetector::new("findbugs", vec![violation("findbugs", "A.java", 3)]);
        let executions = detector.executions();
        let mut aggregator = Aggregator::new(vec![Box::new(detector)]);

        let result = aggregator.run().unwrap();

        assert_eq!(executions.get(), 1);
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn test_failure_aborts_whole_run() {
        let mut aggregator = Aggregator::new(vec![
            Box::new(FixedDetector::new(
                "a",
                vec![
                    violation("a", "x.rs", 1),
                    violation("a", "x.rs", 2),
                    violation("a", "x.rs", 3),
                ],
            )),
            Box::new(FailingDetector::new("b")),
        ]);

        let err = aggregator.run().unwrap_err();
        assert_eq!(err.detector, "b");
    }

    #[test]
    fn test_no_detectors_yields_empty_set() {
        let result = Aggregator::default().run().unwrap();
        assert!(result.violations.is_empty());
    }
}
