//! Build status decision.
//!
//! Maps an aggregated violation set plus the policy to one of three outcomes:
//! pass, a graceful stop of this check only, or a hard failure of the build.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::Policy;
use crate::detect::{Severity, ViolationSet};

/// The build outcome of one check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Pass,
    /// Stop this check only; the rest of the build proceeds.
    SoftFail,
    /// Abort the build.
    HardFail,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Pass => "pass",
            Decision::SoftFail => "soft_fail",
            Decision::HardFail => "hard_fail",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The decision record produced once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub violation_count: usize,
    pub severity_breakdown: BTreeMap<Severity, usize>,
    pub decision: Decision,
}

/// Read-only view of the host build's scheduled tasks.
pub trait TaskGraph {
    fn is_task_scheduled(&self, name: &str) -> bool;
}

/// A fixed set of scheduled task names.
#[derive(Debug, Clone, Default)]
pub struct ScheduledTasks {
    names: BTreeSet<String>,
}

impl ScheduledTasks {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl TaskGraph for ScheduledTasks {
    fn is_task_scheduled(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Decide the build outcome for a violation set.
///
/// A non-empty set is a hard failure only when `fail_on_error` is set and no
/// downstream report task is scheduled to own the final decision.
pub fn decide(violations: &ViolationSet, policy: &Policy, tasks: &dyn TaskGraph) -> CheckOutcome {
    let decision = if violations.is_empty() {
        Decision::Pass
    } else if policy.fail_on_error && !tasks.is_task_scheduled(&policy.report_task) {
        Decision::HardFail
    } else {
        Decision::SoftFail
    };

    CheckOutcome {
        violation_count: violations.len(),
        severity_breakdown: violations.severity_breakdown(),
        decision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Violation;

    fn one(severity: Severity) -> ViolationSet {
        std::iter::once(Violation::new("pmd", "Foo.java", 1, "R", "m", severity).unwrap()).collect()
    }

    fn policy(fail_on_error: bool) -> Policy {
        Policy {
            fail_on_error,
            ..Policy::default()
        }
    }

    #[test]
    fn test_empty_set_passes() {
        let outcome = decide(&ViolationSet::new(), &policy(true), &ScheduledTasks::default());
        assert_eq!(outcome.decision, Decision::Pass);
        assert_eq!(outcome.violation_count, 0);
        assert!(outcome.severity_breakdown.is_empty());
    }

    #[test]
    fn test_error_without_report_task_is_hard_fail() {
        let outcome = decide(&one(Severity::Error), &policy(true), &ScheduledTasks::default());
        assert_eq!(outcome.decision, Decision::HardFail);
        assert_eq!(outcome.severity_breakdown.get(&Severity::Error), Some(&1));
    }

    #[test]
    fn test_error_with_report_task_is_soft_fail() {
        let tasks = ScheduledTasks::new(["compile", "report"]);
        let outcome = decide(&one(Severity::Error), &policy(true), &tasks);
        assert_eq!(outcome.decision, Decision::SoftFail);
    }

    #[test]
    fn test_warning_without_fail_on_error_is_soft_fail() {
        let outcome = decide(&one(Severity::Warning), &policy(false), &ScheduledTasks::default());
        assert_eq!(outcome.decision, Decision::SoftFail);
        assert_eq!(outcome.violation_count, 1);
    }

    #[test]
    fn test_report_task_name_comes_from_policy() {
        let policy = Policy {
            report_task: "publishStatus".to_string(),
            ..Policy::default()
        };
        let outcome = decide(
            &one(Severity::Info),
            &policy,
            &ScheduledTasks::new(["report"]),
        );
        assert_eq!(outcome.decision, Decision::HardFail);

        let outcome = decide(
            &one(Severity::Info),
            &policy,
            &ScheduledTasks::new(["publishStatus"]),
        );
        assert_eq!(outcome.decision, Decision::SoftFail);
    }
}
