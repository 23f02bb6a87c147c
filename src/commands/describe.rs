//! # Describe Command Implementation
//!
//! Prints the composed project descriptor as JSON: the applied units in
//! order, toolchain, dependency declarations, exclusions, quality rules and
//! resolution policy. With `--all`, prints every target (root first) as a
//! JSON array.

use anyhow::Result;
use clap::Args;

use conventions::units::builtin_registry;

use super::{open_session, select, ProjectArgs};

/// Print the composed project descriptor as JSON
#[derive(Args, Debug)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Describe the root project and every module
    #[arg(long, conflicts_with = "module")]
    pub all: bool,
}

/// Execute the `describe` command.
pub fn execute(args: DescribeArgs) -> Result<()> {
    let registry = builtin_registry()?;
    let session = open_session(&args.project, &registry)?;

    let json = if args.all {
        serde_json::to_string_pretty(session.descriptors())?
    } else {
        let (_, project) = select(&session, args.project.module.as_deref())?;
        serde_json::to_string_pretty(project)?
    };
    println!("{}", json);
    Ok(())
}
