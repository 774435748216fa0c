//! In-process detector that scans project files for forbidden patterns.

use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::PatternDetectorConfig;

use super::{DetectorExecutionError, DetectorFailure, Severity, Violation, ViolationDetector};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules", "vendor", "build"];

/// Pre-compiled pattern with metadata.
struct CompiledPattern {
    regex: Regex,
    rule: String,
    severity: Severity,
    description: Option<String>,
}

/// Scans files under a project root line by line.
///
/// Single-phase: the scan happens when results are requested.
pub struct PatternDetector {
    name: String,
    enabled: bool,
    root: PathBuf,
    /// Report output directory, relative to `root`, never scanned.
    report_dir: Option<PathBuf>,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
    patterns: Vec<CompiledPattern>,
}

impl PatternDetector {
    /// Build from configuration. Files under `report_dir` are never scanned,
    /// so earlier reports do not feed back into later runs.
    pub fn from_config(
        config: &PatternDetectorConfig,
        root: &Path,
        report_dir: &Path,
    ) -> anyhow::Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|p| {
                let regex = Regex::new(&p.pattern)
                    .map_err(|e| anyhow::anyhow!("compiling pattern {:?}: {}", p.pattern, e))?;
                Ok(CompiledPattern {
                    regex,
                    rule: p.rule_id().to_string(),
                    severity: p.severity(),
                    description: p.description.clone(),
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            name: config.name.clone(),
            enabled: config.enabled,
            root: root.to_path_buf(),
            report_dir: dir_within(report_dir, root),
            include: build_globset(&config.include)?,
            exclude: build_globset(&config.exclude)?,
            patterns,
        })
    }

    /// Every file this detector would scan, with its root-relative name.
    fn collect_files(&self) -> Result<Vec<(PathBuf, String)>, DetectorFailure> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                if let Some(report_dir) = &self.report_dir {
                    if e.path().strip_prefix(&self.root).ok() == Some(report_dir.as_path()) {
                        return false;
                    }
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && !SKIPPED_DIRS.iter().any(|d| *d == name)
            })
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_path(entry.path(), &self.root);
            if let Some(include) = &self.include {
                if !include.is_match(&relative) {
                    continue;
                }
            }
            if let Some(exclude) = &self.exclude {
                if exclude.is_match(&relative) {
                    continue;
                }
            }
            files.push((entry.into_path(), relative));
        }

        Ok(files)
    }

    /// Scan a single file for forbidden patterns.
    fn scan_file(&self, path: &Path, relative: &str) -> Result<Vec<Violation>, DetectorFailure> {
        let io_err = |source| DetectorFailure::Io {
            path: path.to_path_buf(),
            source,
        };

        let reader = BufReader::new(File::open(path).map_err(io_err)?);
        let mut violations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = match line_result {
                Ok(line) => line,
                // Binary or non-UTF-8 file
                Err(e) if e.kind() == ErrorKind::InvalidData => return Ok(Vec::new()),
                Err(e) => return Err(io_err(e)),
            };

            for p in &self.patterns {
                if !p.regex.is_match(&line) {
                    continue;
                }

                let msg = match &p.description {
                    Some(desc) => desc.clone(),
                    None => format!("pattern {:?} matched", p.regex.as_str()),
                };

                match Violation::new(&self.name, relative, line_num + 1, &p.rule, msg, p.severity) {
                    Ok(v) => violations.push(v),
                    Err(e) => tracing::warn!(detector = %self.name, "skipping finding: {}", e),
                }
            }
        }

        Ok(violations)
    }
}

impl ViolationDetector for PatternDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn detected_violations(&mut self) -> Result<Vec<Violation>, DetectorExecutionError> {
        let wrap = |failure| DetectorExecutionError::new(&self.name, failure);

        let files = self.collect_files().map_err(wrap)?;
        tracing::debug!(detector = %self.name, files = files.len(), "scanning files");

        let per_file: Vec<Vec<Violation>> = files
            .par_iter()
            .map(|(path, relative)| self.scan_file(path, relative))
            .collect::<Result<_, _>>()
            .map_err(wrap)?;

        Ok(per_file.into_iter().flatten().collect())
    }
}

fn build_globset(globs: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if globs.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        builder.add(Glob::new(glob).map_err(|e| anyhow::anyhow!("invalid glob {:?}: {}", glob, e))?);
    }
    Ok(Some(builder.build()?))
}

/// `dir` relative to `root`, if it lies inside it.
fn dir_within(dir: &Path, root: &Path) -> Option<PathBuf> {
    if let Ok(inner) = dir.strip_prefix(root) {
        return Some(inner.to_path_buf());
    }
    // Mixed relative and absolute forms; the directory may not exist yet.
    let root = std::path::absolute(root).ok()?;
    let dir = std::path::absolute(dir).ok()?;
    dir.strip_prefix(&root).ok().map(Path::to_path_buf)
}

/// Path relative to the project root with forward slashes.
pub(crate) fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
