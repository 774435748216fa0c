//! Command-line interface for lintgate.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::check::{CheckError, CheckOrchestrator, CheckRun, CheckStatus};
use crate::config::{self, Config};
use crate::detect::{self, Aggregator};
use crate::report;
use crate::sink::FsArtifactSink;
use crate::status::ScheduledTasks;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Static-analysis quality gate.
///
/// Runs the configured detectors, merges their findings into one
/// deduplicated report and decides whether the build passes, stops this
/// check, or fails.
#[derive(Parser)]
#[command(name = "lintgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run all enabled detectors and decide the build status
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// Create a new lintgate configuration from a template
    Init(InitArgs),
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Project root to check
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to configuration YAML file (default: auto-discover in PATH)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Directory to write the HTML report to
    #[arg(short, long)]
    pub report_dir: Option<PathBuf>,

    /// Stop gracefully instead of failing when violations are found
    #[arg(long)]
    pub no_fail_on_error: bool,

    /// Disable a configured detector by name (repeatable)
    #[arg(long = "disable", value_name = "DETECTOR")]
    pub disabled: Vec<String>,

    /// A task scheduled to run after this check (repeatable)
    #[arg(long = "scheduled", value_name = "TASK")]
    pub scheduled: Vec<String>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "lintgate.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "minimal")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Available configuration templates.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

/// All available templates.
static TEMPLATES: &[Template] = &[
    Template {
        name: "minimal",
        description: "Marker scan only - unfinished work and debug leftovers",
        content: include_str!("templates/minimal.yaml"),
    },
    Template {
        name: "external-tools",
        description: "External linters reporting SARIF or compact output",
        content: include_str!("templates/external-tools.yaml"),
    },
];

/// Load the configuration and apply command-line overrides.
fn load_config(args: &CheckArgs, root: &Path) -> anyhow::Result<(PathBuf, Config)> {
    let config_path = match &args.config {
        Some(p) => p.clone(),
        None => config::discover(root)?,
    };

    let mut config = Config::parse_file(&config_path)
        .map_err(|e| anyhow::anyhow!("parsing {}: {}", config_path.display(), e))?;

    if args.no_fail_on_error {
        config.policy.fail_on_error = false;
    }
    if let Some(dir) = &args.report_dir {
        config.report_dir = Some(dir.clone());
    }
    for name in &args.disabled {
        if !config.disable_detector(name) {
            anyhow::bail!("unknown detector {:?}", name);
        }
    }

    config::validate(&config).map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    Ok((config_path, config))
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let root = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    if !root.is_dir() {
        eprintln!("Error: {} is not a directory", root.display());
        return Ok(EXIT_ERROR);
    }

    let (config_path, config) = match load_config(args, &root) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            if args.config.is_none() {
                eprintln!("Run 'lintgate init' to create a configuration file");
            }
            return Ok(EXIT_ERROR);
        }
    };
    tracing::debug!(config = %config_path.display(), "loaded configuration");

    let detectors = detect::build_detectors(&config, &root)?;
    let tasks = ScheduledTasks::new(args.scheduled.iter().cloned());
    let orchestrator = CheckOrchestrator::new(
        &config.policy,
        Aggregator::new(detectors),
        &FsArtifactSink,
        &tasks,
        config.report_dir(&root),
    );

    match orchestrator.run() {
        Ok(CheckStatus::Disabled) => {
            eprintln!("lintgate is disabled in {}", config_path.display());
            Ok(EXIT_SUCCESS)
        }
        Ok(CheckStatus::Passed(run)) | Ok(CheckStatus::Stopped(run)) => {
            print_run(args, &run)?;
            Ok(EXIT_SUCCESS)
        }
        Err(CheckError::Failed(run)) => {
            print_run(args, &run)?;
            eprintln!("Error: {}", run.failure_message());
            Ok(EXIT_FAILED)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_ERROR)
        }
    }
}

fn print_run(args: &CheckArgs, run: &CheckRun) -> anyhow::Result<()> {
    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, run),
        _ => {
            report::write_pretty(&path_str, run);
            Ok(())
        }
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // List mode
    if args.list {
        return list_templates();
    }

    // Find template
    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'lintgate init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, template.content) {
        eprintln!("Error: failed to write configuration: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to configure your detectors", args.output.display());
    println!("  2. Run: lintgate check . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

/// List available templates.
fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "minimal" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  lintgate init --template <name>");

    Ok(EXIT_SUCCESS)
}
