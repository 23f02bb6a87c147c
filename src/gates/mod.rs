//! # Enforcement Gates
//!
//! A gate turns a quality rule or a resolution-policy flag into a build-time
//! check whose failure aborts the task chain that depends on it.
//!
//! ## State machine
//!
//! Every gate moves through `Pending → Running → {Passed, Failed}`. A failed
//! gate carries structured [`Violation`]s (location plus rule) instead of a
//! bare boolean, so callers can print them or feed them to `format-apply`.
//! If the check itself cannot run (for example a tool is missing) the gate
//! falls back to `Pending` and the error propagates: there is no verdict.
//!
//! Re-evaluating a finished gate starts a new run; a side-effecting fix never
//! flips a gate to `Passed` on its own.
//!
//! ## Aggregation
//!
//! [`GateReport`] collects the outcome of every gate evaluated during a
//! build and derives the process exit code from the enforced ones.

pub mod dependency;
pub mod format;

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// One rule violation at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// File path or dependency coordinate.
    pub location: String,
    /// Rule that was violated.
    pub rule: String,
    pub message: String,
}

impl Violation {
    pub fn new(location: &str, rule: &str, message: &str) -> Self {
        Self {
            location: location.to_string(),
            rule: rule.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.location, self.rule, self.message)
    }
}

/// Lifecycle state of a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Running,
    Passed,
    Failed(Vec<Violation>),
}

impl GateState {
    pub fn is_finished(&self) -> bool {
        matches!(self, GateState::Passed | GateState::Failed(_))
    }
}

/// A named build-time check.
#[derive(Debug, Clone)]
pub struct Gate {
    name: String,
    enforced: bool,
    state: GateState,
}

impl Gate {
    /// A gate whose failure fails the build.
    pub fn enforced(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enforced: true,
            state: GateState::Pending,
        }
    }

    /// A gate whose violations are reported but never fail the build.
    pub fn advisory(name: &str) -> Self {
        Self {
            enforced: false,
            ..Self::enforced(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enforced(&self) -> bool {
        self.enforced
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Run `check` and record the verdict.
    ///
    /// An empty violation list passes the gate.
    pub fn evaluate<F>(&mut self, check: F) -> Result<&GateState>
    where
        F: FnOnce() -> Result<Vec<Violation>>,
    {
        self.state = GateState::Running;
        log::debug!("Gate '{}' running", self.name);

        match check() {
            Ok(violations) if violations.is_empty() => self.state = GateState::Passed,
            Ok(violations) => self.state = GateState::Failed(violations),
            Err(e) => {
                self.state = GateState::Pending;
                return Err(e);
            }
        }

        log::info!("Gate '{}' {}", self.name, self.verdict_label());
        Ok(&self.state)
    }

    /// Convert a finished, enforced failure into [`Error::GateFailure`].
    ///
    /// Advisory gates and passed gates yield `Ok`.
    pub fn verdict(&self) -> Result<()> {
        match &self.state {
            GateState::Failed(violations) if self.enforced => Err(Error::GateFailure {
                gate: self.name.clone(),
                violations: violations.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn verdict_label(&self) -> &'static str {
        match self.state {
            GateState::Pending => "pending",
            GateState::Running => "running",
            GateState::Passed => "passed",
            GateState::Failed(_) if self.enforced => "failed",
            GateState::Failed(_) => "reported violations (not enforced)",
        }
    }
}

/// Outcome of one gate, as recorded in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    pub gate: String,
    pub enforced: bool,
    pub passed: bool,
    pub violations: Vec<Violation>,
}

/// Aggregated results of every gate evaluated in one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GateReport {
    outcomes: Vec<GateOutcome>,
}

impl GateReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished gate. A re-run of the same gate replaces its
    /// previous outcome.
    pub fn record(&mut self, gate: &Gate) {
        let (passed, violations) = match gate.state() {
            GateState::Passed => (true, Vec::new()),
            GateState::Failed(violations) => (false, violations.clone()),
            GateState::Pending | GateState::Running => return,
        };

        let outcome = GateOutcome {
            gate: gate.name().to_string(),
            enforced: gate.is_enforced(),
            passed,
            violations,
        };
        match self.outcomes.iter_mut().find(|o| o.gate == outcome.gate) {
            Some(existing) => *existing = outcome,
            None => self.outcomes.push(outcome),
        }
    }

    pub fn outcomes(&self) -> &[GateOutcome] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    /// Enforced gates that failed.
    pub fn failed(&self) -> impl Iterator<Item = &GateOutcome> {
        self.outcomes.iter().filter(|o| !o.passed && o.enforced)
    }

    /// Advisory gates that reported violations.
    pub fn warnings(&self) -> impl Iterator<Item = &GateOutcome> {
        self.outcomes.iter().filter(|o| !o.passed && !o.enforced)
    }

    /// All violations, enforced or not.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.outcomes.iter().flat_map(|o| o.violations.iter())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
