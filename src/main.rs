//! # Conventions CLI
//!
//! This is the binary entry point for the `conventions` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Handling top-level application errors. `anyhow` prints the error chain
//!   and the process exits with 1; clap usage errors exit with 2.
//!
//! Composition, gates and tasks live in the `conventions` library crate; the
//! binary only loads configuration, picks a target and prints results.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
