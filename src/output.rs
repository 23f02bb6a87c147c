//! # Output Configuration
//!
//! Controls how the CLI decorates its output: colors, status markers and the
//! gate summary printed after a task run.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;

use console::style;

use crate::gates::GateReport;

/// Output configuration for controlling colors and markers.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `always` overrides `NO_COLOR`; `never` wins over everything; `auto`
    /// inspects the environment and whether stdout is a terminal.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Marker for a successful step.
    pub fn ok(&self) -> String {
        if self.use_color {
            style("✓").green().to_string()
        } else {
            "[OK]".to_string()
        }
    }

    /// Marker for a failed step.
    pub fn fail(&self) -> String {
        if self.use_color {
            style("✗").red().to_string()
        } else {
            "[FAIL]".to_string()
        }
    }

    /// Marker for a non-fatal problem.
    pub fn warn(&self) -> String {
        if self.use_color {
            style("!").yellow().to_string()
        } else {
            "[WARN]".to_string()
        }
    }

    /// Dim secondary text when colors are on.
    pub fn dim(&self, text: &str) -> String {
        if self.use_color {
            style(text).dim().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain alternative otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Render one line per gate plus one indented line per violation.
pub fn render_gate_report(config: &OutputConfig, report: &GateReport) -> String {
    let mut out = String::new();
    for outcome in report.outcomes() {
        let marker = match (outcome.passed, outcome.enforced) {
            (true, _) => config.ok(),
            (false, true) => config.fail(),
            (false, false) => config.warn(),
        };
        out.push_str(&format!("{} {}", marker, outcome.gate));
        if !outcome.passed {
            out.push_str(&format!(" ({} violation(s))", outcome.violations.len()));
        }
        out.push('\n');
        for violation in &outcome.violations {
            out.push_str(&format!("    {}\n", violation));
        }
    }
    out
}
