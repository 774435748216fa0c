//! Core types for detection results.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Severity levels for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" | "note" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// A violation was built with a missing mandatory field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("violation {field} must not be empty")]
pub struct InvalidViolation {
    pub field: &'static str,
}

/// A single detected issue.
///
/// Identity is `(file, line, rule, message)`. The producing detector and the
/// severity are metadata, so the same finding reported by two tools compares
/// equal and collapses to one entry in a [`ViolationSet`].
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    source_detector: String,
    file: String,
    line: usize,
    rule: String,
    message: String,
    severity: Severity,
}

impl Violation {
    /// Create a violation. `file`, `rule` and `message` must be non-empty.
    pub fn new(
        source_detector: impl Into<String>,
        file: impl Into<String>,
        line: usize,
        rule: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Result<Self, InvalidViolation> {
        let violation = Self {
            source_detector: source_detector.into(),
            file: file.into(),
            line,
            rule: rule.into(),
            message: message.into(),
            severity,
        };

        if violation.file.is_empty() {
            return Err(InvalidViolation { field: "file" });
        }
        if violation.rule.is_empty() {
            return Err(InvalidViolation { field: "rule" });
        }
        if violation.message.is_empty() {
            return Err(InvalidViolation { field: "message" });
        }

        Ok(violation)
    }

    pub fn source_detector(&self) -> &str {
        &self.source_detector
    }

    /// Path relative to the project root.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// 1-based line, or 0 for a file-level finding.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    fn identity(&self) -> (&str, usize, &str, &str) {
        (&self.file, self.line, &self.rule, &self.message)
    }
}

impl PartialEq for Violation {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Violation {}

impl Hash for Violation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for Violation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered by file, then line, then rule, then message.
impl Ord for Violation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

/// Deduplicated set of violations from one check run.
///
/// Iteration is ordered by file path, then line, so anything rendered from it
/// is stable. The first report of a violation wins; later duplicates only add
/// their detector to the contributor list.
#[derive(Debug, Clone, Default)]
pub struct ViolationSet {
    entries: BTreeMap<Violation, BTreeSet<String>>,
}

impl ViolationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a violation. Returns `true` if it was not already present.
    pub fn insert(&mut self, violation: Violation) -> bool {
        let detector = violation.source_detector.clone();
        match self.entries.get_mut(&violation) {
            Some(detectors) => {
                detectors.insert(detector);
                false
            }
            None => {
                self.entries.insert(violation, BTreeSet::from([detector]));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.entries.contains_key(violation)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.entries.keys()
    }

    /// Names of every detector that reported this violation.
    pub fn reported_by(&self, violation: &Violation) -> Option<&BTreeSet<String>> {
        self.entries.get(violation)
    }

    /// Violations grouped by file, files in lexicographic order.
    pub fn by_file(&self) -> BTreeMap<&str, Vec<&Violation>> {
        let mut files: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
        for v in self.entries.keys() {
            files.entry(v.file()).or_default().push(v);
        }
        files
    }

    /// Number of violations per severity.
    pub fn severity_breakdown(&self) -> BTreeMap<Severity, usize> {
        let mut breakdown = BTreeMap::new();
        for v in self.entries.keys() {
            *breakdown.entry(v.severity()).or_insert(0) += 1;
        }
        breakdown
    }
}

impl Extend<Violation> for ViolationSet {
    fn extend<T: IntoIterator<Item = Violation>>(&mut self, iter: T) {
        for v in iter {
            self.insert(v);
        }
    }
}

impl FromIterator<Violation> for ViolationSet {
    fn from_iter<T: IntoIterator<Item = Violation>>(iter: T) -> Self {
        let mut set = ViolationSet::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(detector: &str, file: &str, line: usize, rule: &str) -> Violation {
        Violation::new(detector, file, line, rule, "message", Severity::Warning).unwrap()
    }

    #[test]
    fn test_equality_ignores_source_detector_and_severity() {
        let a = violation("pmd", "src/Foo.java", 10, "X");
        let b = Violation::new("checkstyle", "src/Foo.java", 10, "X", "message", Severity::Error)
            .unwrap();
        assert_eq!(a, b);

        let c = violation("pmd", "src/Foo.java", 11, "X");
        assert_ne!(a, c);
    }

    #[test]
    fn test_new_rejects_empty_fields() {
        let err = Violation::new("pmd", "", 1, "X", "m", Severity::Info).unwrap_err();
        assert_eq!(err.field, "file");
        let err = Violation::new("pmd", "a.rs", 1, "", "m", Severity::Info).unwrap_err();
        assert_eq!(err.field, "rule");
        let err = Violation::new("pmd", "a.rs", 1, "X", "", Severity::Info).unwrap_err();
        assert_eq!(err.field, "message");
    }

    #[test]
    fn test_line_zero_is_allowed() {
        let v = violation("lint", "README.md", 0, "missing_header");
        assert_eq!(v.line(), 0);
    }

    #[test]
    fn test_set_merges_cross_detector_duplicates() {
        let mut set = ViolationSet::new();
        assert!(set.insert(violation("pmd", "foo.go", 10, "X")));
        assert!(!set.insert(violation("checkstyle", "foo.go", 10, "X")));

        assert_eq!(set.len(), 1);
        let v = set.iter().next().unwrap();
        assert_eq!(v.source_detector(), "pmd");
        let detectors: Vec<_> = set.reported_by(v).unwrap().iter().cloned().collect();
        assert_eq!(detectors, vec!["checkstyle".to_string(), "pmd".to_string()]);
    }

    #[test]
    fn test_set_iterates_by_file_then_line() {
        let set: ViolationSet = vec![
            violation("a", "src/b.rs", 3, "X"),
            violation("a", "src/a.rs", 20, "X"),
            violation("a", "src/a.rs", 2, "X"),
        ]
        .into_iter()
        .collect();

        let order: Vec<_> = set.iter().map(|v| (v.file(), v.line())).collect();
        assert_eq!(order, vec![("src/a.rs", 2), ("src/a.rs", 20), ("src/b.rs", 3)]);

        let grouped = set.by_file();
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec!["src/a.rs", "src/b.rs"]);
        assert_eq!(grouped["src/a.rs"].len(), 2);
    }

    #[test]
    fn test_severity_breakdown() {
        let set: ViolationSet = vec![
            Violation::new("a", "x.rs", 1, "R", "one", Severity::Error).unwrap(),
            Violation::new("a", "x.rs", 2, "R", "two", Severity::Warning).unwrap(),
            Violation::new("a", "x.rs", 3, "R", "three", Severity::Warning).unwrap(),
        ]
        .into_iter()
        .collect();

        let breakdown = set.severity_breakdown();
        assert_eq!(breakdown.get(&Severity::Error), Some(&1));
        assert_eq!(breakdown.get(&Severity::Warning), Some(&2));
        assert_eq!(breakdown.get(&Severity::Info), None);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("ERROR".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("note".parse::<Severity>(), Ok(Severity::Info));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert!("fatal".parse::<Severity>().is_err());
    }
}
