//! In-memory detectors for unit tests.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use super::{DetectorExecutionError, DetectorFailure, Violation, ViolationDetector};

/// Returns a fixed list of violations.
pub struct FixedDetector {
    name: String,
    enabled: bool,
    violations: Vec<Violation>,
    calls: Rc<Cell<usize>>,
}

impl FixedDetector {
    pub fn new(name: &str, violations: Vec<Violation>) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            violations,
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl ViolationDetector for FixedDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn detected_violations(&mut self) -> Result<Vec<Violation>, DetectorExecutionError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.violations.clone())
    }
}

/// Fails as if its tool binary were missing.
pub struct FailingDetector {
    name: String,
}

impl FailingDetector {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl ViolationDetector for FailingDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn detected_violations(&mut self) -> Result<Vec<Violation>, DetectorExecutionError> {
        Err(DetectorExecutionError::new(
            &self.name,
            DetectorFailure::MissingReport(PathBuf::from("missing.xml")),
        ))
    }
}

/// Only yields its violations after `execute_reporter` ran.
pub struct TwoPhaseDetector {
    name: String,
    violations: Vec<Violation>,
    executions: Rc<Cell<usize>>,
}

impl TwoPhaseDetector {
    pub fn new(name: &str, violations: Vec<Violation>) -> Self {
        Self {
            name: name.to_string(),
            violations,
            executions: Rc::new(Cell::new(0)),
        }
    }

    pub fn executions(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.executions)
    }
}

impl ViolationDetector for TwoPhaseDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn needs_explicit_execution(&self) -> bool {
        true
    }

    fn execute_reporter(&mut self) -> Result<(), DetectorExecutionError> {
        self.executions.set(self.executions.get() + 1);
        Ok(())
    }

    fn detected_violations(&mut self) -> Result<Vec<Violation>, DetectorExecutionError> {
        if self.executions.get() == 0 {
            return Ok(Vec::new());
        }
        Ok(self.violations.clone())
    }
}
