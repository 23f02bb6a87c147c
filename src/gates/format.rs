//! Formatting gate.
//!
//! One gate per formatting rule. The gate collects the source files the rule
//! covers and asks the rule's tool to check them. Nothing is ever modified in
//! check mode; `apply` is the only entry point that rewrites files, and
//! `diff` previews what `apply` would do on a scratch copy.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use similar::TextDiff;
use walkdir::WalkDir;

use crate::descriptor::QualityRule;
use crate::error::Result;
use crate::tool::{Tool, ToolMode, ToolOptions};

use super::{Gate, Violation};

/// Name of the gate for the formatting rule `key`.
pub fn gate_name(key: &str) -> String {
    format!("format-check:{}", key)
}

/// Files under `roots` whose extension the rule covers, relative to
/// `project_dir` and sorted. Missing roots are skipped.
pub fn collect_targets(
    project_dir: &Path,
    roots: &[PathBuf],
    rule: &QualityRule,
    exclude: &[Pattern],
) -> Result<Vec<PathBuf>> {
    let mut targets = Vec::new();

    for root in roots {
        let absolute = project_dir.join(root);
        if !absolute.is_dir() {
            log::debug!(
                "Source root {} does not exist, skipping",
                absolute.display()
            );
            continue;
        }

        for entry in WalkDir::new(&absolute).follow_links(false) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let covered = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| rule.extensions.iter().any(|x| x == e))
                .unwrap_or(false);
            if !covered {
                continue;
            }

            let relative = path.strip_prefix(project_dir).unwrap_or(path).to_path_buf();
            if exclude.iter().any(|p| p.matches_path(&relative)) {
                continue;
            }
            targets.push(relative);
        }
    }

    targets.sort();
    targets.dedup();
    Ok(targets)
}

fn options(rule: &QualityRule, mode: ToolMode, working_dir: &Path) -> ToolOptions {
    ToolOptions::new(mode, working_dir)
        .with_version(&rule.version)
        .with_settings(&rule.options)
}

/// Ask the tool which targets violate the rule.
pub fn check(
    tool: &dyn Tool,
    key: &str,
    rule: &QualityRule,
    project_dir: &Path,
    targets: &[PathBuf],
) -> Result<Vec<Violation>> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let check = options(rule, ToolMode::Check, project_dir);
    let output = tool.invoke(&rule.tool, targets, &check)?;
    Ok(output
        .violations
        .into_iter()
        .map(|v| Violation {
            rule: key.to_string(),
            ..v
        })
        .collect())
}

/// Evaluate the gate for one rule.
///
/// Enforced rules produce an enforced gate, the others an advisory one.
pub fn evaluate(
    tool: &dyn Tool,
    key: &str,
    rule: &QualityRule,
    project_dir: &Path,
    targets: &[PathBuf],
) -> Result<Gate> {
    let name = gate_name(key);
    let mut gate = if rule.enforced {
        Gate::enforced(&name)
    } else {
        Gate::advisory(&name)
    };
    gate.evaluate(|| check(tool, key, rule, project_dir, targets))?;
    Ok(gate)
}

/// Rewrite the targets in place. Returns the files the tool changed.
pub fn apply(
    tool: &dyn Tool,
    rule: &QualityRule,
    project_dir: &Path,
    targets: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }
    let apply = options(rule, ToolMode::Apply, project_dir);
    let output = tool.invoke(&rule.tool, targets, &apply)?;
    Ok(output.modified_files)
}

/// A unified diff for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub diff: String,
}

/// What `apply` would change, computed on a scratch copy of the targets.
pub fn diff(
    tool: &dyn Tool,
    rule: &QualityRule,
    project_dir: &Path,
    targets: &[PathBuf],
) -> Result<Vec<FileDiff>> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let scratch = tempfile::TempDir::new()?;
    for target in targets {
        let destination = scratch.path().join(target);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(project_dir.join(target), &destination)?;
    }

    let modified = apply(tool, rule, scratch.path(), targets)?;

    let mut diffs = Vec::new();
    for path in modified {
        let before = fs::read_to_string(project_dir.join(&path))?;
        let after = fs::read_to_string(scratch.path().join(&path))?;
        let display = path.to_string_lossy();
        let diff = TextDiff::from_lines(&before, &after)
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{}", display), &format!("b/{}", display))
            .to_string();
        diffs.push(FileDiff { path, diff });
    }
    Ok(diffs)
}
