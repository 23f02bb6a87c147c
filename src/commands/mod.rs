//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `conventions` command-line tool. Each subcommand is defined in its own
//! file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`. Commands that work on a project flatten
//!   [`ProjectArgs`] into it.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! The task commands (`build`, `test`, `clean`, `publish-local`, `format-*`)
//! share [`run_task`]: open a [`Session`], register the standard tasks for
//! the selected target and run one of them.

pub mod build;
pub mod check_versions;
pub mod clean;
pub mod describe;
pub mod format;
pub mod hooks;
pub mod publish_local;
pub mod units;

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use conventions::config::{self, BuildTarget, ProjectConfig};
use conventions::defaults::CONFIG_FILE;
use conventions::descriptor::ProjectDescriptor;
use conventions::orchestrator::Session;
use conventions::output::{render_gate_report, OutputConfig};
use conventions::pipeline::{Pipeline, PipelineReport};
use conventions::registry::UnitRegistry;
use conventions::resolve::DeclaredResolver;
use conventions::suggestions;
use conventions::tasks::{LocalTaskRunner, TaskOutcome, TaskRunner};
use conventions::tool::CommandTool;
use conventions::units::builtin_registry;

/// Options shared by every command that works on a project.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project root directory
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Path to the configuration file (defaults to .conventions.yaml in the
    /// project root)
    #[arg(short, long, value_name = "FILE", env = "CONVENTIONS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Module to operate on (defaults to the root project)
    #[arg(short, long, value_name = "NAME")]
    pub module: Option<String>,
}

impl ProjectArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.project_dir.join(CONFIG_FILE))
    }
}

/// Load and validate the project configuration.
pub fn load_config(args: &ProjectArgs) -> Result<ProjectConfig> {
    let path = args.config_path();
    if !path.exists() {
        return Err(suggestions::config_not_found(&path));
    }
    config::from_file(&path).map_err(|e| {
        anyhow::anyhow!("Failed to load config from {}: {}", path.display(), e)
    })
}

/// Resolve versions and compose every target.
pub fn open_session(args: &ProjectArgs, registry: &UnitRegistry) -> Result<Session> {
    let config = load_config(args)?;
    log::debug!("Loaded configuration for '{}'", config.name);
    Session::open(&args.project_dir, config, registry)
        .map_err(|e| suggestions::explain(e, registry))
}

/// The target picked with `--module`, or the root project.
pub fn select<'s>(
    session: &'s Session,
    module: Option<&str>,
) -> Result<(&'s BuildTarget, &'s ProjectDescriptor)> {
    session.select(module).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown module: {}\n\nModules are: {}",
            module.unwrap_or_default(),
            session.target_names().join(", ")
        )
    })
}

/// Run one standard task against the selected target.
///
/// Prints the gate report and the status of every task that was reached. A
/// failed task turns into an error carrying the first failure.
pub fn run_task(
    args: &ProjectArgs,
    task: &str,
    local_repository: &Path,
    color: &str,
) -> Result<PipelineReport> {
    let registry = builtin_registry()?;
    let session = open_session(args, &registry)?;
    let (target, project) = select(&session, args.module.as_deref())?;
    let layout = session.layout(target, local_repository)?;
    let tool = CommandTool::new(session.config.tools.clone());
    let resolver = DeclaredResolver;
    let report = RefCell::new(PipelineReport::default());

    let summary = {
        let mut runner = LocalTaskRunner::new();
        Pipeline {
            project,
            layout: &layout,
            tool: &tool,
            resolver: &resolver,
            report: &report,
        }
        .register(&mut runner)?;
        runner.run(task)?
    };

    let out = OutputConfig::from_env_and_flag(color);
    let report = report.into_inner();
    print!("{}", render_gate_report(&out, &report.gates));

    let mut first_failure = None;
    for (name, outcome) in summary.into_outcomes() {
        match outcome {
            TaskOutcome::Succeeded => println!("{} {}", out.ok(), name),
            TaskOutcome::Skipped { .. } => {
                let detail = out.dim(&outcome.to_string());
                println!("{} {} {}", out.warn(), name, detail);
            }
            TaskOutcome::Failed(error) => {
                println!("{} {}", out.fail(), name);
                if first_failure.is_none() {
                    first_failure = Some((name, error));
                }
            }
        }
    }

    match first_failure {
        None => Ok(report),
        Some((name, error)) => {
            Err(suggestions::explain(error, &registry).context(format!("Task '{}' failed", name)))
        }
    }
}
