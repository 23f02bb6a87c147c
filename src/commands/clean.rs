//! # Clean Command Implementation

use anyhow::Result;
use clap::Args;

use conventions::defaults::default_local_repository;
use conventions::pipeline::CLEAN;

use super::{run_task, ProjectArgs};

/// Remove the build directory
#[derive(Args, Debug)]
pub struct CleanArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Execute the `clean` command.
pub fn execute(args: CleanArgs, color: &str) -> Result<()> {
    run_task(&args.project, CLEAN, &default_local_repository(), color)?;
    Ok(())
}
