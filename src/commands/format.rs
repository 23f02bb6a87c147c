//! # Format Commands Implementation
//!
//! - **`format-check`**: evaluates one gate per formatting rule. Enforced
//!   rules fail the command; advisory ones only print warnings.
//! - **`format-apply`**: rewrites sources in place and lists the files that
//!   changed. It never records a gate as passed.
//! - **`format-diff`**: applies the formatters to temporary copies and prints
//!   unified diffs. The project is left untouched.

use anyhow::Result;
use clap::Args;

use conventions::defaults::default_local_repository;
use conventions::pipeline::{FORMAT_APPLY, FORMAT_CHECK, FORMAT_DIFF};

use super::{run_task, ProjectArgs};

/// Arguments shared by the format commands
#[derive(Args, Debug)]
pub struct FormatArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Execute the `format-check` command.
pub fn execute_check(args: FormatArgs, color: &str) -> Result<()> {
    let repository = default_local_repository();
    let report = run_task(&args.project, FORMAT_CHECK, &repository, color)?;
    if report.gates.is_empty() {
        println!("No formatting rules to check");
    }
    Ok(())
}

/// Execute the `format-apply` command.
pub fn execute_apply(args: FormatArgs, color: &str) -> Result<()> {
    let repository = default_local_repository();
    let report = run_task(&args.project, FORMAT_APPLY, &repository, color)?;
    if report.modified_files.is_empty() {
        println!("All files already formatted");
    } else {
        println!("Formatted {} file(s):", report.modified_files.len());
        for path in &report.modified_files {
            println!("  {}", path.display());
        }
    }
    Ok(())
}

/// Execute the `format-diff` command.
pub fn execute_diff(args: FormatArgs, color: &str) -> Result<()> {
    let repository = default_local_repository();
    let report = run_task(&args.project, FORMAT_DIFF, &repository, color)?;
    if report.diffs.is_empty() {
        println!("No formatting changes");
        return Ok(());
    }
    for file_diff in &report.diffs {
        print!("{}", file_diff.diff);
    }
    println!("{} file(s) would be reformatted", report.diffs.len());
    Ok(())
}
