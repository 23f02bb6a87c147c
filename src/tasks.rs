//! # Task Runner
//!
//! Named tasks with prerequisites, run in dependency order.
//!
//! ## Process
//!
//! 1. **Validate**: walk the prerequisite graph from the requested task;
//!    unknown names and cycles fail before any action runs.
//! 2. **Execute**: prerequisites first (declaration order), then the task.
//!    Each task runs at most once per [`TaskRunner::run`] call.
//! 3. **Finalize**: after a task has run (successfully or not) its
//!    finalizers run, unless they already ran.
//!
//! A failed task marks every task that depends on it as skipped. Tasks that
//! do not depend on the failure still run.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{Error, Result};

/// Work performed by a task.
pub type TaskAction<'a> = Box<dyn FnMut() -> Result<()> + 'a>;

/// Registers and executes named tasks.
pub trait TaskRunner<'a> {
    fn register_task(
        &mut self,
        name: &str,
        prerequisites: &[&str],
        action: TaskAction<'a>,
    ) -> Result<()>;

    /// Run `finalizer` after `task` whenever `task` runs.
    fn finalized_by(&mut self, task: &str, finalizer: &str) -> Result<()>;

    /// Run `name` and everything it needs.
    fn run(&mut self, name: &str) -> Result<RunSummary>;
}

struct Task<'a> {
    prerequisites: Vec<String>,
    finalizers: Vec<String>,
    action: TaskAction<'a>,
}

/// What happened to one task.
#[derive(Debug)]
pub enum TaskOutcome {
    Succeeded,
    Failed(Error),
    Skipped { blocked_by: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded)
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Succeeded => write!(f, "succeeded"),
            TaskOutcome::Failed(e) => write!(f, "failed: {}", e),
            TaskOutcome::Skipped { blocked_by } => write!(f, "skipped ({} failed)", blocked_by),
        }
    }
}

/// Outcomes of one run, in execution order.
#[derive(Debug, Default)]
pub struct RunSummary {
    outcomes: Vec<(String, TaskOutcome)>,
}

impl RunSummary {
    pub fn outcomes(&self) -> &[(String, TaskOutcome)] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<(String, TaskOutcome)> {
        self.outcomes
    }

    pub fn outcome(&self, task: &str) -> Option<&TaskOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == task)
            .map(|(_, o)| o)
    }

    /// Names of the tasks that ran, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| !matches!(o, TaskOutcome::Skipped { .. }))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|(n, o)| match o {
            TaskOutcome::Failed(e) => Some((n.as_str(), e)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| o.is_success())
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// In-process task runner.
#[derive(Default)]
pub struct LocalTaskRunner<'a> {
    tasks: HashMap<String, Task<'a>>,
    order: Vec<String>,
}

impl<'a> LocalTaskRunner<'a> {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registered task names, in registration order.
    pub fn task_names(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// The order tasks would run in for `name`, finalizers included.
    pub fn plan(&self, name: &str) -> Result<Vec<String>> {
        let mut planner = Planner {
            tasks: &self.tasks,
            done: HashSet::new(),
            visiting: Vec::new(),
            order: Vec::new(),
        };
        planner.visit(name, None)?;
        Ok(planner.order)
    }

    fn execute(
        &mut self,
        name: &str,
        summary: &mut RunSummary,
        finished: &mut HashMap<String, bool>,
    ) -> bool {
        if let Some(ok) = finished.get(name) {
            return *ok;
        }

        let (prerequisites, finalizers) = match self.tasks.get(name) {
            Some(task) => (task.prerequisites.clone(), task.finalizers.clone()),
            None => return false,
        };

        let mut blocked_by = None;
        for prerequisite in &prerequisites {
            if !self.execute(prerequisite, summary, finished) && blocked_by.is_none() {
                blocked_by = Some(prerequisite.clone());
            }
        }

        if let Some(blocked_by) = blocked_by {
            log::info!("> Task :{} SKIPPED", name);
            finished.insert(name.to_string(), false);
            summary
                .outcomes
                .push((name.to_string(), TaskOutcome::Skipped { blocked_by }));
            return false;
        }

        log::info!("> Task :{}", name);
        let result = match self.tasks.get_mut(name) {
            Some(task) => (task.action)(),
            None => Ok(()),
        };
        let ok = result.is_ok();
        finished.insert(name.to_string(), ok);
        let outcome = match result {
            Ok(()) => TaskOutcome::Succeeded,
            Err(e) => {
                log::warn!("Task '{}' failed: {}", name, e);
                TaskOutcome::Failed(e)
            }
        };
        summary.outcomes.push((name.to_string(), outcome));

        for finalizer in &finalizers {
            self.execute(finalizer, summary, finished);
        }
        ok
    }
}

impl<'a> TaskRunner<'a> for LocalTaskRunner<'a> {
    fn register_task(
        &mut self,
        name: &str,
        prerequisites: &[&str],
        action: TaskAction<'a>,
    ) -> Result<()> {
        if self.tasks.contains_key(name) {
            return Err(Error::DuplicateTask {
                name: name.to_string(),
            });
        }
        self.tasks.insert(
            name.to_string(),
            Task {
                prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
                finalizers: Vec::new(),
                action,
            },
        );
        self.order.push(name.to_string());
        Ok(())
    }

    fn finalized_by(&mut self, task: &str, finalizer: &str) -> Result<()> {
        if !self.tasks.contains_key(finalizer) {
            return Err(Error::UnknownTask {
                name: finalizer.to_string(),
                required_by: Some(task.to_string()),
            });
        }
        let entry = self.tasks.get_mut(task).ok_or_else(|| Error::UnknownTask {
            name: task.to_string(),
            required_by: None,
        })?;
        if !entry.finalizers.iter().any(|f| f == finalizer) {
            entry.finalizers.push(finalizer.to_string());
        }
        Ok(())
    }

    fn run(&mut self, name: &str) -> Result<RunSummary> {
        self.plan(name)?;

        let mut summary = RunSummary::default();
        let mut finished = HashMap::new();
        self.execute(name, &mut summary, &mut finished);
        Ok(summary)
    }
}

struct Planner<'r, 'a> {
    tasks: &'r HashMap<String, Task<'a>>,
    done: HashSet<String>,
    visiting: Vec<String>,
    order: Vec<String>,
}

impl Planner<'_, '_> {
    fn visit(&mut self, name: &str, required_by: Option<&str>) -> Result<()> {
        if self.done.contains(name) {
            return Ok(());
        }
        if let Some(start) = self.visiting.iter().position(|n| n == name) {
            let mut cycle: Vec<&str> = self.visiting[start..].iter().map(String::as_str).collect();
            cycle.push(name);
            return Err(Error::CyclicTasks {
                cycle: cycle.join(" -> "),
            });
        }

        let task = self.tasks.get(name).ok_or_else(|| Error::UnknownTask {
            name: name.to_string(),
            required_by: required_by.map(str::to_string),
        })?;

        self.visiting.push(name.to_string());
        for prerequisite in &task.prerequisites {
            self.visit(prerequisite, Some(name))?;
        }
        self.visiting.pop();

        self.done.insert(name.to_string());
        self.order.push(name.to_string());

        for finalizer in &task.finalizers {
            self.visit(finalizer, Some(name))?;
        }
        Ok(())
    }
}
