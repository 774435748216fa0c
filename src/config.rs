//! Configuration schema for lintgate.
//!
//! A configuration file declares the detectors to run and the policy that
//! turns their findings into a build status.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::detect::Severity;

/// File names searched for in the project root, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["lintgate.yaml", ".lintgate.yaml", "lintgate.yml"];

/// Default location of the HTML report, relative to the project root.
pub const DEFAULT_REPORT_DIR: &str = "build/reports/lintgate";

/// Name of the downstream task that owns the final failure decision.
pub const DEFAULT_REPORT_TASK: &str = "report";

/// Rule id used by pattern detectors when none is configured.
pub const DEFAULT_PATTERN_RULE: &str = "forbidden_pattern";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(flatten)]
    pub policy: Policy,
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
    #[serde(default)]
    pub detectors: Vec<DetectorConfig>,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Report directory resolved against the project root.
    pub fn report_dir(&self, root: &Path) -> PathBuf {
        let dir = self
            .report_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR));
        if dir.is_absolute() {
            dir
        } else {
            root.join(dir)
        }
    }

    /// Turn off a detector by name. Returns false if no detector matched.
    pub fn disable_detector(&mut self, name: &str) -> bool {
        let mut found = false;
        for detector in self.detectors.iter_mut().filter(|d| d.name() == name) {
            detector.set_enabled(false);
            found = true;
        }
        found
    }
}

/// The decision-relevant switches, read-only for one run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Policy {
    /// Global kill switch. When false, a check is a no-op.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub fail_on_error: bool,
    #[serde(default = "default_report_task")]
    pub report_task: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_on_error: true,
            report_task: DEFAULT_REPORT_TASK.to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_report_task() -> String {
    DEFAULT_REPORT_TASK.to_string()
}

/// One configured detector.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DetectorConfig {
    /// Regex scan run in-process.
    Pattern(PatternDetectorConfig),
    /// External tool that writes a report file.
    Command(CommandDetectorConfig),
}

impl DetectorConfig {
    pub fn name(&self) -> &str {
        match self {
            DetectorConfig::Pattern(c) => &c.name,
            DetectorConfig::Command(c) => &c.name,
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            DetectorConfig::Pattern(c) => c.enabled,
            DetectorConfig::Command(c) => c.enabled,
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        match self {
            DetectorConfig::Pattern(c) => c.enabled = enabled,
            DetectorConfig::Command(c) => c.enabled = enabled,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PatternDetectorConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Globs of files to scan, relative to the project root. Empty means all.
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<PatternRule>,
}

/// A regex that must not appear in scanned files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PatternRule {
    pub pattern: String,
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PatternRule {
    pub fn rule_id(&self) -> &str {
        self.rule.as_deref().unwrap_or(DEFAULT_PATTERN_RULE)
    }

    pub fn severity(&self) -> Severity {
        self.severity.unwrap_or(Severity::Warning)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandDetectorConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Report file the tool writes, relative to the project root.
    pub report: PathBuf,
    #[serde(default)]
    pub format: ReportFormat,
}

/// Report formats a command detector can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Sarif,
    /// `path:line[:col]: severity: message [rule]`, one finding per line.
    Compact,
}

/// Discover a configuration file in the project root.
pub fn discover(root: &Path) -> anyhow::Result<PathBuf> {
    for name in DEFAULT_CONFIG_NAMES {
        let path = root.join(name);
        if path.is_file() {
            return Ok(path);
        }
    }
    anyhow::bail!(
        "no configuration file found in {} (looked for {})",
        root.display(),
        DEFAULT_CONFIG_NAMES.join(", ")
    )
}

/// Check a configuration before any detector runs.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.policy.report_task.trim().is_empty() {
        anyhow::bail!("report_task must not be empty");
    }

    let mut seen = HashSet::new();
    for detector in &config.detectors {
        let name = detector.name();
        if name.trim().is_empty() {
            anyhow::bail!("detector name must not be empty");
        }
        if !seen.insert(name) {
            anyhow::bail!("duplicate detector name {:?}", name);
        }

        match detector {
            DetectorConfig::Pattern(c) => {
                if c.patterns.is_empty() {
                    anyhow::bail!("pattern detector {:?} has no patterns", name);
                }
                for p in &c.patterns {
                    regex::Regex::new(&p.pattern).map_err(|e| {
                        anyhow::anyhow!("detector {:?}: invalid pattern {:?}: {}", name, p.pattern, e)
                    })?;
                    if p.rule_id().is_empty() {
                        anyhow::bail!("detector {:?}: pattern {:?} has an empty rule", name, p.pattern);
                    }
                }
                for glob in c.include.iter().chain(&c.exclude) {
                    globset::Glob::new(glob).map_err(|e| {
                        anyhow::anyhow!("detector {:?}: invalid glob {:?}: {}", name, glob, e)
                    })?;
                }
            }
            DetectorConfig::Command(c) => {
                if c.command.trim().is_empty() {
                    anyhow::bail!("command detector {:?} has no command", name);
                }
                if c.report.as_os_str().is_empty() {
                    anyhow::bail!("command detector {:?} has no report path", name);
                }
            }
        }
    }

    Ok(())
}
