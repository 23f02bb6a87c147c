//! # Check-Versions Command Implementation
//!
//! Validates `conventions.properties` and regenerates
//! `.conventions/versions.generated.toml` when the property content changed.
//! Running it twice in a row regenerates at most once.
//!
//! This command does not read `.conventions.yaml` and composes nothing.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use conventions::defaults::{GENERATED_VERSIONS_FILE, PROPERTY_SOURCE_FILE};
use conventions::orchestrator::resolve_versions;
use conventions::output::{emoji, OutputConfig};
use conventions::suggestions;
use conventions::units::builtin_registry;
use conventions::versions::GenerationStatus;

/// Validate version properties and refresh the generated versions file
#[derive(Args, Debug)]
pub struct CheckVersionsArgs {
    /// Project root directory
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Only report the status, without listing the constants
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `check-versions` command.
pub fn execute(args: CheckVersionsArgs, color: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color);
    let registry = builtin_registry()?;
    let resolution = resolve_versions(&args.project_dir)
        .map_err(|e| suggestions::explain(e, &registry))?;

    println!("{} {} is valid", out.ok(), PROPERTY_SOURCE_FILE);
    match resolution.status {
        GenerationStatus::Regenerated => println!(
            "{} Regenerated {}",
            emoji(&out, "🔄", "*"),
            GENERATED_VERSIONS_FILE
        ),
        GenerationStatus::Fresh => println!("{} is up to date", GENERATED_VERSIONS_FILE),
    }

    if !args.quiet {
        println!();
        for (name, value) in resolution.versions.constants() {
            println!("  {} = {}", name, value);
        }
    }
    Ok(())
}
