//! # Error Suggestions
//!
//! Helpers that turn library errors into CLI messages that say what went
//! wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use conventions::suggestions;
//!
//! let session = Session::open(&dir, config, &registry)
//!     .map_err(|e| suggestions::explain(e, &registry))?;
//! ```

use std::path::Path;

use crate::error::Error;
use crate::registry::UnitRegistry;
use crate::versions::REQUIRED_KEYS;

/// Generate an error for when the configuration file is not found.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a .conventions.yaml file with at least 'name:' and 'units:'\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set CONVENTIONS_CONFIG environment variable",
        path = path.display()
    )
}

/// Generate an error for a unit name nobody registered.
///
/// Suggests the closest registered name when one is close enough.
pub fn unknown_unit(
    name: &str,
    required_by: Option<&str>,
    registry: &UnitRegistry,
) -> anyhow::Error {
    let candidates = registry.names();
    let did_you_mean = find_similar(name, &candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    let context = required_by
        .map(|r| format!(" (required by '{r}')"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown convention unit: {name}{context}{did_you_mean}\n\n\
         Registered units are: {units}\n\
         hint: Run 'conventions units' to list units and their prerequisites",
        units = candidates.join(", ")
    )
}

/// Generate an error for a cycle in unit prerequisites.
pub fn cycle_detected(cycle: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Cycle detected in convention unit prerequisites: {cycle}\n\n\
         hint: Remove one of the prerequisites on the path to break the cycle\n\
         hint: Nothing was applied to the project"
    )
}

/// Generate an error for two units that cannot share a project.
pub fn mutually_exclusive(unit: &str, other: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Convention units '{unit}' and '{other}' cannot be applied to the same project\n\n\
         hint: Keep only one of them in 'units:'\n\
         hint: Move one of them into a separate entry under 'modules:'"
    )
}

/// Generate an error for a missing key in the property source.
pub fn missing_version_property(key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Missing version property '{key}' in {file}\n\n\
         hint: Add '{key}=<version>' to {file}\n\
         hint: Required keys are: {keys}",
        file = crate::defaults::PROPERTY_SOURCE_FILE,
        keys = REQUIRED_KEYS.join(", ")
    )
}

/// Generate an error for a missing property source.
pub fn property_source_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Property source not found: {path}\n\n\
         hint: Create {file} in the project root with one 'key=value' line per version\n\
         hint: Use -C/--project-dir if you are not in the project root",
        path = path.display(),
        file = crate::defaults::PROPERTY_SOURCE_FILE
    )
}

/// Generate an error for a tool with no command.
pub fn tool_not_configured(tool: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Tool '{tool}' is not configured\n\n\
         hint: Add it under 'tools:' in .conventions.yaml, for example:\n\
         \n  tools:\n    {tool}:\n      command: {tool}\n      check: [...]\n      apply: [...]"
    )
}

/// Translate a library error into a hinted CLI error.
///
/// Errors without a dedicated hint pass through unchanged.
pub fn explain(error: Error, registry: &UnitRegistry) -> anyhow::Error {
    match error.root() {
        Error::UnknownUnit { name, required_by } => {
            unknown_unit(name, required_by.as_deref(), registry)
        }
        Error::CyclicDependency { cycle } => cycle_detected(cycle),
        Error::MutuallyExclusiveUnits { unit, other } => mutually_exclusive(unit, other),
        Error::MissingVersionProperty { key } => missing_version_property(key),
        Error::SourceNotFound { path } => property_source_not_found(path),
        Error::ToolNotConfigured { tool } => tool_not_configured(tool),
        _ => anyhow::Error::new(error),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(&input.to_lowercase(), &candidate.to_lowercase());
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance, single-row variant.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, a_char) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }

    row[b_chars.len()]
}
