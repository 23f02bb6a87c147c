//! # External Tool Invocation
//!
//! Formatters, coverage reporters and test runners are external programs.
//! The pipeline only ever talks to them through the [`Tool`] trait so the
//! gates can be exercised with an in-process fake.
//!
//! ## Command tools
//!
//! [`CommandTool`] runs the command configured for a tool in
//! `.conventions.yaml`:
//!
//! ```yaml
//! tools:
//!   google-java-format:
//!     command: google-java-format
//!     check: ["--dry-run", "--set-exit-if-changed"]
//!     apply: ["--replace"]
//! ```
//!
//! Arguments may reference `{version}` and any rule option by key, for
//! example `{style}`. Target files are appended after the mode arguments.
//!
//! - **Check / Report**: exit status zero means no violations. Otherwise
//!   every output line that names a target becomes a violation for that
//!   target; if no line names one, a single violation carries the first
//!   line of output.
//! - **Apply**: the tool must exit zero. Modified files are detected by
//!   comparing content hashes before and after the run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::gates::Violation;

/// What the tool is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    /// Report violations without modifying anything.
    Check,
    /// Rewrite the targets in place.
    Apply,
    /// Produce a report (tests, coverage); violations describe failures.
    Report,
}

/// Per-invocation settings.
#[derive(Debug, Clone)]
pub struct ToolOptions {
    pub mode: ToolMode,
    /// Tool version pinned by the rule, if any.
    pub version: String,
    pub settings: BTreeMap<String, String>,
    /// Directory the tool runs in. Relative targets resolve against it.
    pub working_dir: PathBuf,
}

impl ToolOptions {
    pub fn new(mode: ToolMode, working_dir: &Path) -> Self {
        Self {
            mode,
            version: String::new(),
            settings: BTreeMap::new(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_settings(mut self, settings: &BTreeMap<String, String>) -> Self {
        self.settings = settings.clone();
        self
    }
}

/// Result of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub modified_files: Vec<PathBuf>,
    pub violations: Vec<Violation>,
}

/// Capability to run a named external tool.
pub trait Tool {
    fn invoke(&self, tool: &str, targets: &[PathBuf], options: &ToolOptions) -> Result<ToolOutput>;
}

/// How to run one tool, as declared in the project configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolCommand {
    pub command: String,
    /// Arguments passed in every mode, before the mode arguments.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub check: Vec<String>,
    #[serde(default)]
    pub apply: Vec<String>,
    #[serde(default)]
    pub report: Vec<String>,
}

impl ToolCommand {
    fn mode_args(&self, mode: ToolMode) -> &[String] {
        match mode {
            ToolMode::Check => &self.check,
            ToolMode::Apply => &self.apply,
            ToolMode::Report => &self.report,
        }
    }
}

/// Runs configured commands as child processes.
#[derive(Debug, Clone, Default)]
pub struct CommandTool {
    commands: BTreeMap<String, ToolCommand>,
}

impl CommandTool {
    pub fn new(commands: BTreeMap<String, ToolCommand>) -> Self {
        Self { commands }
    }

    pub fn is_configured(&self, tool: &str) -> bool {
        self.commands.contains_key(tool)
    }

    fn build_command(
        &self,
        tool: &str,
        targets: &[PathBuf],
        options: &ToolOptions,
    ) -> Result<Command> {
        let configured = self
            .commands
            .get(tool)
            .ok_or_else(|| Error::ToolNotConfigured {
                tool: tool.to_string(),
            })?;

        let mut command = Command::new(&configured.command);
        command.current_dir(&options.working_dir);
        let mode_args = configured.mode_args(options.mode);
        for arg in configured.args.iter().chain(mode_args) {
            command.arg(expand_placeholders(arg, options));
        }
        command.args(targets);
        Ok(command)
    }
}

impl Tool for CommandTool {
    fn invoke(&self, tool: &str, targets: &[PathBuf], options: &ToolOptions) -> Result<ToolOutput> {
        let mut command = self.build_command(tool, targets, options)?;
        log::debug!("Running {:?}", command);

        let before = match options.mode {
            ToolMode::Apply => Some(hash_files(&options.working_dir, targets)?),
            _ => None,
        };

        let output = command.output().map_err(|e| Error::ToolInvocation {
            tool: tool.to_string(),
            message: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if let Some(before) = before {
            if !output.status.success() {
                return Err(Error::ToolInvocation {
                    tool: tool.to_string(),
                    message: format!("{}: {}", output.status, stderr.trim()),
                });
            }
            let after = hash_files(&options.working_dir, targets)?;
            let modified_files = targets
                .iter()
                .zip(before.iter().zip(after.iter()))
                .filter(|(_, (b, a))| b != a)
                .map(|(target, _)| target.clone())
                .collect();
            return Ok(ToolOutput {
                modified_files,
                violations: Vec::new(),
            });
        }

        if output.status.success() {
            return Ok(ToolOutput::default());
        }

        let lines: Vec<&str> = stdout
            .lines()
            .chain(stderr.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let violations = parse_violations(tool, targets, &lines, &output.status.to_string());
        Ok(ToolOutput {
            modified_files: Vec::new(),
            violations,
        })
    }
}

/// Replace `{version}` and `{<option>}` placeholders in one argument.
fn expand_placeholders(arg: &str, options: &ToolOptions) -> String {
    if !arg.contains('{') {
        return arg.to_string();
    }
    let mut expanded = arg.replace("{version}", &options.version);
    for (key, value) in &options.settings {
        expanded = expanded.replace(&format!("{{{}}}", key), value);
    }
    expanded
}

/// One violation per target mentioned in the output, or a single one for
/// the tool when no target is mentioned.
fn parse_violations(
    tool: &str,
    targets: &[PathBuf],
    lines: &[&str],
    status: &str,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for target in targets {
        let name = target.to_string_lossy();
        if let Some(line) = lines.iter().find(|line| names_path(line, &name)) {
            violations.push(Violation::new(&name, tool, line));
        }
    }

    if violations.is_empty() {
        let message = lines.first().copied().unwrap_or(status);
        violations.push(Violation::new(tool, tool, message));
    }
    violations
}

/// Whether `line` mentions `path` as a whole path: `src/App.kt: bad` names
/// `src/App.kt`, while `src/App.kts: bad` does not.
fn names_path(line: &str, path: &str) -> bool {
    let is_path_char = |c: char| c.is_alphanumeric() || matches!(c, '.' | '_' | '-');
    line.match_indices(path).any(|(start, _)| {
        let before = line[..start].chars().next_back();
        let after = line[start + path.len()..].chars().next();
        !before.is_some_and(is_path_char) && !after.is_some_and(is_path_char)
    })
}

fn hash_files(working_dir: &Path, targets: &[PathBuf]) -> Result<Vec<String>> {
    targets
        .iter()
        .map(|target| {
            let content = fs::read(working_dir.join(target))?;
            Ok(hex::encode(Sha256::digest(&content)))
        })
        .collect()
}
