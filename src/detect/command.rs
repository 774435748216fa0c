//! Detector backed by an external linter that writes a report file.

use regex::Regex;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use url::Url;

use crate::config::{CommandDetectorConfig, ReportFormat};

use super::pattern::relative_path;
use super::{DetectorExecutionError, DetectorFailure, Severity, Violation, ViolationDetector};

static COMPACT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<file>.+?):(?P<line>\d+)(?::\d+)?: (?P<severity>error|warning|warn|info|note): (?P<message>.+?)(?: \[(?P<rule>[^\]]+)\])?$",
    )
    .expect("compact report pattern is valid")
});

/// Two-phase detector: the tool runs in `execute_reporter`, its report is
/// parsed in `detected_violations`.
pub struct CommandDetector {
    name: String,
    enabled: bool,
    root: PathBuf,
    command: String,
    args: Vec<String>,
    report: PathBuf,
    format: ReportFormat,
    executed: bool,
}

impl CommandDetector {
    pub fn from_config(config: &CommandDetectorConfig, root: &Path) -> Self {
        Self {
            name: config.name.clone(),
            enabled: config.enabled,
            root: root.to_path_buf(),
            command: config.command.clone(),
            args: config.args.clone(),
            report: root.join(&config.report),
            format: config.format,
            executed: false,
        }
    }

    fn error(&self, failure: DetectorFailure) -> DetectorExecutionError {
        DetectorExecutionError::new(&self.name, failure)
    }

    fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ViolationDetector for CommandDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn needs_explicit_execution(&self) -> bool {
        true
    }

    fn execute_reporter(&mut self) -> Result<(), DetectorExecutionError> {
        if self.executed {
            tracing::debug!(detector = %self.name, "reporter already executed this run");
            return Ok(());
        }

        // A leftover report from an earlier run must not pass for this one.
        match std::fs::remove_file(&self.report) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(self.error(DetectorFailure::Io {
                    path: self.report.clone(),
                    source,
                }))
            }
        }

        tracing::debug!(detector = %self.name, command = %self.command_line(), "running");
        let output = Command::new(&self.command)
            .args(&self.args)
            .current_dir(&self.root)
            .output()
            .map_err(|source| {
                self.error(DetectorFailure::Spawn {
                    command: self.command_line(),
                    source,
                })
            })?;

        // Linters exit non-zero when they find issues.
        if !output.status.success() {
            tracing::debug!(
                detector = %self.name,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "tool exited unsuccessfully"
            );
        }

        if !self.report.is_file() {
            return Err(self.error(DetectorFailure::MissingReport(self.report.clone())));
        }

        self.executed = true;
        Ok(())
    }

    fn detected_violations(&mut self) -> Result<Vec<Violation>, DetectorExecutionError> {
        if !self.executed {
            tracing::warn!(detector = %self.name, "reading report before the tool ran this run");
        }

        let content = std::fs::read_to_string(&self.report).map_err(|source| {
            let failure = if source.kind() == ErrorKind::NotFound {
                DetectorFailure::MissingReport(self.report.clone())
            } else {
                DetectorFailure::Io {
                    path: self.report.clone(),
                    source,
                }
            };
            self.error(failure)
        })?;

        let parsed = match self.format {
            ReportFormat::Sarif => parse_sarif(&content, &self.name, &self.root),
            ReportFormat::Compact => Ok(parse_compact(&content, &self.name, &self.root)),
        };

        parsed.map_err(|reason| {
            self.error(DetectorFailure::MalformedReport {
                path: self.report.clone(),
                reason,
            })
        })
    }
}

// =============================================================================
// SARIF input
// =============================================================================

#[derive(Deserialize)]
struct SarifLog {
    #[serde(default)]
    runs: Vec<SarifRun>,
}

#[derive(Deserialize)]
struct SarifRun {
    #[serde(default)]
    results: Vec<SarifResult>,
}

#[derive(Deserialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: Option<String>,
    level: Option<String>,
    message: SarifMessage,
    #[serde(default)]
    locations: Vec<SarifLocation>,
}

#[derive(Deserialize)]
struct SarifMessage {
    text: Option<String>,
}

#[derive(Deserialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: Option<SarifPhysicalLocation>,
}

#[derive(Deserialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: Option<SarifArtifact>,
    region: Option<SarifRegion>,
}

#[derive(Deserialize)]
struct SarifArtifact {
    uri: Option<String>,
}

#[derive(Deserialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: Option<usize>,
}

fn map_level_to_severity(level: Option<&str>) -> Severity {
    match level {
        Some("error") => Severity::Error,
        Some("note") | Some("none") => Severity::Info,
        // SARIF's default level is "warning"
        _ => Severity::Warning,
    }
}

/// Parse a SARIF 2.1.0 log into violations.
fn parse_sarif(content: &str, detector: &str, root: &Path) -> Result<Vec<Violation>, String> {
    let log: SarifLog = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let mut violations = Vec::new();

    for result in log.runs.into_iter().flat_map(|r| r.results) {
        let physical = result
            .locations
            .into_iter()
            .find_map(|l| l.physical_location);
        let (uri, line) = match physical {
            Some(p) => (
                p.artifact_location.and_then(|a| a.uri),
                p.region.and_then(|r| r.start_line).unwrap_or(0),
            ),
            None => (None, 0),
        };

        let file = uri.map(|u| uri_to_relative(&u, root)).unwrap_or_default();
        let rule = result.rule_id.unwrap_or_else(|| detector.to_string());
        let severity = map_level_to_severity(result.level.as_deref());
        let message = result.message.text.unwrap_or_default();

        match Violation::new(detector, file, line, rule, message, severity) {
            Ok(v) => violations.push(v),
            Err(e) => tracing::warn!(detector, "skipping SARIF result: {}", e),
        }
    }

    Ok(violations)
}

/// Parse `path:line[:col]: severity: message [rule]` lines. Other lines are ignored.
fn parse_compact(content: &str, detector: &str, root: &Path) -> Vec<Violation> {
    content
        .lines()
        .filter_map(|line| COMPACT_LINE.captures(line.trim_end()))
        .filter_map(|caps| {
            let line = caps["line"].parse().ok()?;
            let severity = caps["severity"].parse().unwrap_or(Severity::Warning);
            let rule = caps
                .name("rule")
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| detector.to_string());

            Violation::new(
                detector,
                relative_path(Path::new(&caps["file"]), root),
                line,
                rule,
                &caps["message"],
                severity,
            )
            .map_err(|e| tracing::warn!(detector, "skipping report line: {}", e))
            .ok()
        })
        .collect()
}

/// Resolve a SARIF artifact URI against the project root, percent-decoded,
/// as a root-relative path.
fn uri_to_relative(uri: &str, root: &Path) -> String {
    let base = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let resolved = Url::from_directory_path(&base)
        .ok()
        .and_then(|base_url| base_url.join(uri).ok())
        .and_then(|url| url.to_file_path().ok());

    match resolved {
        Some(path) => relative_path(&path, &base),
        // Not a file location; keep it as reported
        None => relative_path(Path::new(uri), root),
    }
}
