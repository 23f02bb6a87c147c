//! # Publish-Local Command Implementation
//!
//! Runs `build` and copies the assembled descriptor into the local
//! repository at `<repository>/<group>/<name>/<version>/<name>-<version>.json`.
//! The copy is written atomically under a file lock, so concurrent publishes
//! of the same version never leave a torn file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use conventions::defaults::default_local_repository;
use conventions::pipeline::PUBLISH_LOCAL;

use super::{run_task, ProjectArgs};

/// Build and publish the descriptor to the local repository
#[derive(Args, Debug)]
pub struct PublishLocalArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// The local repository root.
    ///
    /// Defaults to `~/.conventions/repository`.
    /// Can also be set with the `CONVENTIONS_LOCAL_REPO` environment variable.
    #[arg(long, value_name = "DIR", env = "CONVENTIONS_LOCAL_REPO")]
    pub repository: Option<PathBuf>,
}

/// Execute the `publish-local` command.
pub fn execute(args: PublishLocalArgs, color: &str) -> Result<()> {
    let repository = args.repository.unwrap_or_else(default_local_repository);
    let report = run_task(&args.project, PUBLISH_LOCAL, &repository, color)?;
    if let Some(published) = report.artifacts.last() {
        println!("Published {}", published.display());
    }
    Ok(())
}
