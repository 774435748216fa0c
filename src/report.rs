//! Output formatting for lintgate results.
//!
//! - HTML: the self-contained report document written next to its stylesheet
//! - Pretty: colored terminal summary for humans
//! - JSON: structured summary for programmatic consumption

use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::check::CheckRun;
use crate::detect::{DetectorCount, Severity, Violation, ViolationSet};
use crate::status::{CheckOutcome, Decision};

/// File name of the HTML report inside the report directory.
pub const REPORT_FILE_NAME: &str = "lintgate.html";

/// File name of the stylesheet the report links to.
pub const STYLESHEET_FILE_NAME: &str = "lintgate.css";

const STYLESHEET: &str = include_str!("assets/lintgate.css");

const SUCCESS_MESSAGE: &str = "No violations found.";

/// Path of the HTML report inside a report directory.
pub fn report_path(dir: &Path) -> PathBuf {
    dir.join(REPORT_FILE_NAME)
}

// =============================================================================
// HTML Format
// =============================================================================

/// A rendered report: the document plus the style asset it links to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub document: String,
    pub stylesheet: &'static str,
}

/// Render a violation set to a standalone HTML document.
///
/// Output depends only on the set, so rendering the same set twice gives
/// byte-identical documents.
pub fn render(violations: &ViolationSet) -> RenderedReport {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>lintgate report</title>\n");
    html.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{}\">\n",
        STYLESHEET_FILE_NAME
    ));
    html.push_str("</head>\n<body>\n<article class=\"report\">\n");

    if violations.is_empty() {
        html.push_str(&format!("<p class=\"success\">{}</p>\n", SUCCESS_MESSAGE));
    } else {
        write_html_violations(&mut html, violations);
    }

    html.push_str("</article>\n</body>\n</html>\n");

    RenderedReport {
        document: html,
        stylesheet: STYLESHEET,
    }
}

fn write_html_violations(html: &mut String, violations: &ViolationSet) {
    let files = violations.by_file();
    html.push_str(&format!(
        "<h1>{} in {}</h1>\n",
        plural(violations.len(), "violation"),
        plural(files.len(), "file")
    ));

    for (file, file_violations) in files {
        html.push_str(&format!(
            "<section class=\"file\">\n<h2>{}</h2>\n",
            escape_html(file)
        ));
        html.push_str(
            "<table>\n<tr><th>Line</th><th>Severity</th><th>Rule</th><th>Message</th><th>Reported by</th></tr>\n",
        );

        for v in file_violations {
            let detectors = violations
                .reported_by(v)
                .map(|d| d.iter().cloned().collect::<Vec<_>>().join(", "))
                .unwrap_or_else(|| v.source_detector().to_string());
            let line = if v.line() > 0 {
                v.line().to_string()
            } else {
                "-".to_string()
            };

            html.push_str(&format!(
                "<tr><td class=\"line\">{line}</td><td class=\"severity-{severity}\">{severity}</td><td class=\"rule\">{rule}</td><td class=\"message\">{message}</td><td class=\"detectors\">{detectors}</td></tr>\n",
                line = line,
                severity = v.severity(),
                rule = escape_html(v.rule()),
                message = escape_html(v.message()),
                detectors = escape_html(&detectors),
            ));
        }

        html.push_str("</table>\n</section>\n");
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON summary of a check run.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub report: String,
    pub decision: Decision,
    pub violation_count: usize,
    pub breakdown: BTreeMap<Severity, usize>,
    pub detectors: Vec<DetectorCount>,
    pub violations: Vec<JsonViolation>,
}

#[derive(Debug, Serialize)]
pub struct JsonViolation {
    pub rule: String,
    pub severity: Severity,
    pub file: String,
    pub line: usize,
    pub message: String,
    pub detectors: Vec<String>,
}

/// Build the JSON summary for a finished run.
pub fn json_report(path: &str, run: &CheckRun) -> JsonReport {
    let violations = &run.aggregation.violations;

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        report: run.report_path.to_string_lossy().to_string(),
        decision: run.outcome.decision,
        violation_count: run.outcome.violation_count,
        breakdown: run.outcome.severity_breakdown.clone(),
        detectors: run.aggregation.counts.clone(),
        violations: violations
            .iter()
            .map(|v| violation_to_json(v, violations))
            .collect(),
    }
}

/// Write the JSON summary to stdout.
pub fn write_json(path: &str, run: &CheckRun) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(path, run))?;
    println!("{}", json);
    Ok(())
}

fn violation_to_json(v: &Violation, set: &ViolationSet) -> JsonViolation {
    JsonViolation {
        rule: v.rule().to_string(),
        severity: v.severity(),
        file: v.file().to_string(),
        line: v.line(),
        message: v.message().to_string(),
        detectors: set
            .reported_by(v)
            .map(|d| d.iter().cloned().collect())
            .unwrap_or_default(),
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(path: &str, run: &CheckRun) {
    // Header
    println!();
    print!("  ");
    print!("{}", "lintgate".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Checking: ".dimmed());
    println!("{}", path);
    print!("  {}", "Report:   ".dimmed());
    println!("{}", run.report_path.display());
    println!();

    if !run.aggregation.counts.is_empty() {
        write_detector_counts(&run.aggregation.counts);
        println!();
    }

    let violations = &run.aggregation.violations;
    if !violations.is_empty() {
        write_violations(violations);
        println!();
        write_breakdown(&run.outcome);
        println!();
    }

    write_final_status(&run.outcome);
    println!();
}

fn write_detector_counts(counts: &[DetectorCount]) {
    println!("  {}", "Detectors:".bold());
    for c in counts {
        println!("    {:<20} {}", c.detector, plural(c.violations, "violation"));
    }
}

fn write_violations(violations: &ViolationSet) {
    println!("  {} ({}):", "Violations".bold(), violations.len());

    for (file, file_violations) in violations.by_file() {
        println!();
        println!("    {}", file.blue());
        for v in file_violations {
            write_severity_tag(&v.severity());
            print!(" ");
            if v.line() > 0 {
                print!("{}", format!("{:>5}", v.line()).dimmed());
            } else {
                print!("{}", "    -".dimmed());
            }
            print!("  {:<24}", v.rule().dimmed());
            println!("{}", v.message());
        }
    }
}

fn write_severity_tag(severity: &Severity) {
    match severity {
        Severity::Error => print!("      {}", "ERROR".red()),
        Severity::Warning => print!("      {}", "WARN ".yellow()),
        Severity::Info => print!("      {}", "INFO ".blue()),
    }
}

fn write_breakdown(outcome: &CheckOutcome) {
    println!("  {}", "Breakdown:".bold());
    for (severity, count) in &outcome.severity_breakdown {
        println!("    {:<10} {:>4}", severity.as_str(), count);
    }
}

fn write_final_status(outcome: &CheckOutcome) {
    match outcome.decision {
        Decision::Pass => print!("  {}", "✓ PASSED".green()),
        Decision::SoftFail => print!("  {}", "■ STOPPED".yellow()),
        Decision::HardFail => print!("  {}", "✗ FAILED".red()),
    }
    println!(
        "  {}",
        format!("({})", plural(outcome.violation_count, "violation")).dimmed()
    );
}
