//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Conventions - Compose build configuration from reusable convention units
#[derive(Parser, Debug)]
#[command(name = "conventions")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check formatting and dependencies, then assemble the project descriptor
    Build(commands::build::BuildArgs),

    /// Run the test tool, then the coverage report
    Test(commands::test::TestArgs),

    /// Remove the build directory
    Clean(commands::clean::CleanArgs),

    /// Build and copy the descriptor into the local repository
    PublishLocal(commands::publish_local::PublishLocalArgs),

    /// Validate conventions.properties and refresh the generated versions file
    CheckVersions(commands::check_versions::CheckVersionsArgs),

    /// Run every formatting rule in check mode
    FormatCheck(commands::format::FormatArgs),

    /// Rewrite sources with every formatting rule
    FormatApply(commands::format::FormatArgs),

    /// Show what format-apply would change, without touching the project
    FormatDiff(commands::format::FormatArgs),

    /// Install a git pre-commit hook that runs format-check
    SetupHooks(commands::hooks::SetupHooksArgs),

    /// List registered convention units
    Units(commands::units::UnitsArgs),

    /// Print the composed project descriptor as JSON
    Describe(commands::describe::DescribeArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let color = self.color.as_str();

        match self.command {
            Commands::Build(args) => commands::build::execute(args, color),
            Commands::Test(args) => commands::test::execute(args, color),
            Commands::Clean(args) => commands::clean::execute(args, color),
            Commands::PublishLocal(args) => commands::publish_local::execute(args, color),
            Commands::CheckVersions(args) => commands::check_versions::execute(args, color),
            Commands::FormatCheck(args) => commands::format::execute_check(args, color),
            Commands::FormatApply(args) => commands::format::execute_apply(args, color),
            Commands::FormatDiff(args) => commands::format::execute_diff(args, color),
            Commands::SetupHooks(args) => commands::hooks::execute(args),
            Commands::Units(args) => commands::units::execute(args),
            Commands::Describe(args) => commands::describe::execute(args),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .init();
}
