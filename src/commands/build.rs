//! # Build Command Implementation
//!
//! Runs the `build` task: the enforced format gate (when any formatting rule
//! is enforced), the dependency gate, and `assemble`, which writes the
//! composed descriptor to `build/conventions/<name>.json`.
//!
//! A failing gate stops the build; independent prerequisites still run so
//! the report shows every problem at once.

use anyhow::Result;
use clap::Args;

use conventions::defaults::default_local_repository;
use conventions::pipeline::BUILD;

use super::{run_task, ProjectArgs};

/// Check and assemble the project
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs, color: &str) -> Result<()> {
    let report = run_task(&args.project, BUILD, &default_local_repository(), color)?;
    for artifact in &report.artifacts {
        println!("Wrote {}", artifact.display());
    }
    Ok(())
}
