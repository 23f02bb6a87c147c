//! # Standard Build Tasks
//!
//! Wires a composed [`ProjectDescriptor`] into a [`TaskRunner`]:
//!
//! | Task               | Prerequisites                                         |
//! |--------------------|-------------------------------------------------------|
//! | `clean`            |                                                       |
//! | `format-check`     |                                                       |
//! | `format-apply`     |                                                       |
//! | `format-diff`      |                                                       |
//! | `dependency-check` |                                                       |
//! | `assemble`         |                                                       |
//! | `build`            | `format-check` (if enforced), `dependency-check`, `assemble` |
//! | `test`             | finalized by `coverage-report`                        |
//! | `coverage-report`  |                                                       |
//! | `publish-local`    | `build`                                               |
//!
//! Task actions only read the descriptor. Everything a task wants to show
//! the user (gate outcomes, modified files, diffs, written artifacts) goes
//! into the shared [`PipelineReport`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::artifact::{ArtifactStore, FileArtifactStore};
use crate::descriptor::{ProjectDescriptor, QualityRule, RuleKind};
use crate::error::{Error, Result};
use crate::gates::format::{self, FileDiff};
use crate::gates::{dependency, Gate, GateReport, Violation};
use crate::resolve::DependencyResolver;
use crate::tasks::TaskRunner;
use crate::tool::{Tool, ToolMode, ToolOptions};

pub const CLEAN: &str = "clean";
pub const FORMAT_CHECK: &str = "format-check";
pub const FORMAT_APPLY: &str = "format-apply";
pub const FORMAT_DIFF: &str = "format-diff";
pub const DEPENDENCY_CHECK: &str = "dependency-check";
pub const ASSEMBLE: &str = "assemble";
pub const BUILD: &str = "build";
pub const TEST: &str = "test";
pub const COVERAGE_REPORT: &str = "coverage-report";
pub const PUBLISH_LOCAL: &str = "publish-local";

/// Tool used by the `test` task.
pub const TEST_TOOL: &str = "test";

/// Where a project's files live.
#[derive(Debug, Clone)]
pub struct Layout {
    pub project_dir: PathBuf,
    pub build_dir: PathBuf,
    /// Source roots per language, relative to `project_dir`.
    pub sources: BTreeMap<String, Vec<PathBuf>>,
    pub exclude: Vec<Pattern>,
    pub local_repository: PathBuf,
}

impl Layout {
    /// Source roots a rule covers: the roots of its language, or every root
    /// for language-independent rules.
    pub fn roots_for(&self, rule: &QualityRule) -> Vec<PathBuf> {
        match &rule.language {
            Some(language) => self.sources.get(language).cloned().unwrap_or_default(),
            None => self.sources.values().flatten().cloned().collect(),
        }
    }

    /// Where `assemble` writes the descriptor of `project`.
    pub fn descriptor_path(&self, project: &ProjectDescriptor) -> PathBuf {
        self.build_dir
            .join("conventions")
            .join(format!("{}.json", project.name))
    }

    /// Where `publish-local` copies the descriptor of `project`.
    pub fn published_path(&self, project: &ProjectDescriptor) -> PathBuf {
        self.local_repository
            .join(&project.group)
            .join(&project.name)
            .join(&project.version)
            .join(format!("{}-{}.json", project.name, project.version))
    }
}

/// What the tasks of one run produced.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub gates: GateReport,
    pub modified_files: Vec<PathBuf>,
    pub diffs: Vec<FileDiff>,
    pub artifacts: Vec<PathBuf>,
}

/// Everything the standard tasks need.
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    pub project: &'a ProjectDescriptor,
    pub layout: &'a Layout,
    pub tool: &'a dyn Tool,
    pub resolver: &'a dyn DependencyResolver,
    pub report: &'a RefCell<PipelineReport>,
}

impl<'a> Pipeline<'a> {
    /// Register every standard task with `runner`.
    pub fn register<R: TaskRunner<'a>>(self, runner: &mut R) -> Result<()> {
        runner.register_task(CLEAN, &[], Box::new(move || self.clean()))?;
        runner.register_task(FORMAT_CHECK, &[], Box::new(move || self.format_check()))?;
        runner.register_task(FORMAT_APPLY, &[], Box::new(move || self.format_apply()))?;
        runner.register_task(FORMAT_DIFF, &[], Box::new(move || self.format_diff()))?;
        runner.register_task(
            DEPENDENCY_CHECK,
            &[],
            Box::new(move || self.dependency_check()),
        )?;
        runner.register_task(ASSEMBLE, &[], Box::new(move || self.assemble()))?;

        let mut build_prerequisites = Vec::new();
        if self.project.format_rules().any(|(_, rule)| rule.enforced) {
            build_prerequisites.push(FORMAT_CHECK);
        }
        build_prerequisites.extend([DEPENDENCY_CHECK, ASSEMBLE]);
        let name = self.project.name.clone();
        runner.register_task(
            BUILD,
            &build_prerequisites,
            Box::new(move || {
                log::info!("Build of '{}' complete", name);
                Ok(())
            }),
        )?;

        runner.register_task(TEST, &[], Box::new(move || self.test()))?;
        runner.register_task(
            COVERAGE_REPORT,
            &[],
            Box::new(move || self.coverage_report()),
        )?;
        runner.finalized_by(TEST, COVERAGE_REPORT)?;

        runner.register_task(
            PUBLISH_LOCAL,
            &[BUILD],
            Box::new(move || self.publish_local()),
        )?;
        Ok(())
    }

    fn clean(&self) -> Result<()> {
        let build_dir = &self.layout.build_dir;
        if build_dir.exists() {
            fs::remove_dir_all(build_dir)?;
            log::info!("Removed {}", build_dir.display());
        }
        Ok(())
    }

    fn targets(&self, rule: &QualityRule) -> Result<Vec<PathBuf>> {
        format::collect_targets(
            &self.layout.project_dir,
            &self.layout.roots_for(rule),
            rule,
            &self.layout.exclude,
        )
    }

    fn format_check(&self) -> Result<()> {
        let mut failed: Vec<(String, Vec<Violation>)> = Vec::new();

        for (key, rule) in self.project.format_rules() {
            let targets = self.targets(rule)?;
            let gate = match format::evaluate(
                self.tool,
                key,
                rule,
                &self.layout.project_dir,
                &targets,
            ) {
                Ok(gate) => gate,
                Err(Error::ToolNotConfigured { tool }) if !rule.enforced => {
                    log::warn!("Skipping '{}': tool '{}' is not configured", key, tool);
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.report.borrow_mut().gates.record(&gate);
            match gate.verdict() {
                Ok(()) => warn_advisory(&gate),
                Err(Error::GateFailure { gate, violations }) => failed.push((gate, violations)),
                Err(e) => return Err(e),
            }
        }

        match failed.len() {
            0 => Ok(()),
            1 => {
                let (gate, violations) = failed.remove(0);
                Err(Error::GateFailure { gate, violations })
            }
            _ => Err(Error::GateFailure {
                gate: FORMAT_CHECK.to_string(),
                violations: failed.into_iter().flat_map(|(_, v)| v).collect(),
            }),
        }
    }

    fn format_apply(&self) -> Result<()> {
        for (key, rule) in self.project.format_rules() {
            let targets = self.targets(rule)?;
            match format::apply(self.tool, rule, &self.layout.project_dir, &targets) {
                Ok(modified) => {
                    log::info!("'{}' modified {} file(s)", key, modified.len());
                    self.report.borrow_mut().modified_files.extend(modified);
                }
                Err(Error::ToolNotConfigured { tool }) if !rule.enforced => {
                    log::warn!("Skipping '{}': tool '{}' is not configured", key, tool);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn format_diff(&self) -> Result<()> {
        for (key, rule) in self.project.format_rules() {
            let targets = self.targets(rule)?;
            match format::diff(self.tool, rule, &self.layout.project_dir, &targets) {
                Ok(diffs) => self.report.borrow_mut().diffs.extend(diffs),
                Err(Error::ToolNotConfigured { tool }) if !rule.enforced => {
                    log::warn!("Skipping '{}': tool '{}' is not configured", key, tool);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn dependency_check(&self) -> Result<()> {
        let policy = self.project.resolution_policy();
        if !policy.is_strict() {
            log::debug!("Resolution policy is lenient, skipping dependency gate");
            return Ok(());
        }

        let graph = self.resolver.resolve(self.project)?;
        let mut gate = Gate::enforced(DEPENDENCY_CHECK);
        gate.evaluate(|| Ok(dependency::check(policy, &graph)))?;
        self.report.borrow_mut().gates.record(&gate);
        gate.verdict()
    }

    fn assemble(&self) -> Result<()> {
        let path = self.layout.descriptor_path(self.project);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self.project)?;
        fs::write(&path, json + "\n")?;
        log::info!("Wrote {}", path.display());
        self.report.borrow_mut().artifacts.push(path);
        Ok(())
    }

    fn test(&self) -> Result<()> {
        let options = ToolOptions::new(ToolMode::Report, &self.layout.project_dir);
        let mut gate = Gate::enforced(TEST);
        gate.evaluate(|| Ok(self.tool.invoke(TEST_TOOL, &[], &options)?.violations))?;
        self.report.borrow_mut().gates.record(&gate);
        gate.verdict()
    }

    fn coverage_report(&self) -> Result<()> {
        let Some((key, rule)) = self
            .project
            .quality_rules()
            .iter()
            .find(|(_, rule)| rule.kind == RuleKind::Coverage)
        else {
            log::debug!("No coverage rule, nothing to report");
            return Ok(());
        };

        let options = ToolOptions::new(ToolMode::Report, &self.layout.project_dir)
            .with_version(&rule.version)
            .with_settings(&rule.options);
        let mut gate = if rule.enforced {
            Gate::enforced(COVERAGE_REPORT)
        } else {
            Gate::advisory(COVERAGE_REPORT)
        };

        gate.evaluate(|| {
            let output = self.tool.invoke(&rule.tool, &[], &options)?;
            Ok(output
                .violations
                .into_iter()
                .map(|v| Violation {
                    rule: key.clone(),
                    ..v
                })
                .collect())
        })?;
        self.report.borrow_mut().gates.record(&gate);
        warn_advisory(&gate);
        gate.verdict()
    }

    fn publish_local(&self) -> Result<()> {
        let project = self.project;
        if project.group.is_empty() || project.version.is_empty() {
            return Err(Error::ConfigParse {
                message: format!(
                    "project '{}' has no group or version to publish under",
                    project.name
                ),
                hint: Some("Set 'group:' and 'version:' in .conventions.yaml".to_string()),
            });
        }

        let source = self.layout.descriptor_path(project);
        let content = fs::read_to_string(&source)?;
        let destination = self.layout.published_path(project);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        // Renamed into place, so readers never see a partial descriptor
        FileArtifactStore::new(&destination).replace(&content)?;
        log::info!("Published {}", destination.display());
        self.report.borrow_mut().artifacts.push(destination);
        Ok(())
    }
}

fn warn_advisory(gate: &Gate) {
    if gate.is_enforced() {
        return;
    }
    if let crate::gates::GateState::Failed(violations) = gate.state() {
        for violation in violations {
            log::warn!("{}: {}", gate.name(), violation);
        }
    }
}

/// The default layout for a project rooted at `project_dir`.
pub fn default_layout(project_dir: &Path, local_repository: &Path) -> Layout {
    Layout {
        project_dir: project_dir.to_path_buf(),
        build_dir: project_dir.join(crate::defaults::BUILD_DIR),
        sources: crate::defaults::default_sources(),
        exclude: Vec::new(),
        local_repository: local_repository.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Scope;
    use crate::engine::CompositionEngine;
    use crate::resolve::DeclaredResolver;
    use crate::tasks::{LocalTaskRunner, RunSummary, TaskOutcome};
    use crate::tool::fakes::TrailingWhitespace;
    use crate::tool::ToolOutput;
    use crate::units::{self, FRAMEWORK_WEB, STRICT_FORMATTING};
    use crate::versions::fixtures::sample_versions;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn compose(units: &[&str]) -> ProjectDescriptor {
        let registry = units::builtin_registry().unwrap();
        let versions = sample_versions();
        let engine = CompositionEngine::new(&registry, &versions);
        let mut project = ProjectDescriptor::new("orders").with_coordinates("com.acme", "1.0.0");
        engine.apply_all(&mut project, units).unwrap();
        project
    }

    /// Formats with trailing-whitespace rules no matter which formatter the
    /// rule names, and records test/coverage runs.
    struct Harness {
        calls: RefCell<Vec<String>>,
        coverage_violations: Cell<bool>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                coverage_violations: Cell::new(false),
            }
        }
    }

    impl Tool for Harness {
        fn invoke(
            &self,
            tool: &str,
            targets: &[PathBuf],
            options: &ToolOptions,
        ) -> Result<ToolOutput> {
            self.calls.borrow_mut().push(tool.to_string());
            match tool {
                "google-java-format" | "ktlint" => {
                    TrailingWhitespace.invoke(TrailingWhitespace::NAME, targets, options)
                }
                "jacoco" if self.coverage_violations.get() => Ok(ToolOutput {
                    modified_files: vec![],
                    violations: vec![Violation::new("orders", "jacoco", "line ratio 0.42 < 0.80")],
                }),
                _ => Ok(ToolOutput::default()),
            }
        }
    }

    fn layout(dir: &TempDir) -> Layout {
        default_layout(dir.path(), &dir.path().join("repository"))
    }

    fn write_source(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn run(
        project: &ProjectDescriptor,
        layout: &Layout,
        tool: &dyn Tool,
        task: &str,
    ) -> (RunSummary, PipelineReport) {
        let report = RefCell::new(PipelineReport::default());
        let summary = {
            let mut runner = LocalTaskRunner::new();
            Pipeline {
                project,
                layout,
                tool,
                resolver: &DeclaredResolver,
                report: &report,
            }
            .register(&mut runner)
            .unwrap();
            runner.run(task).unwrap()
        };
        (summary, report.into_inner())
    }

    #[test]
    fn test_build_skips_format_check_when_not_enforced() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "src/main/java/Main.java", "class Main {}  \n");
        let project = compose(&[units::QUALITY_FORMATTING]);

        let (summary, report) = run(&project, &layout(&dir), &Harness::new(), BUILD);
        assert_eq!(summary.executed(), vec![DEPENDENCY_CHECK, ASSEMBLE, BUILD]);
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(
            report.artifacts,
            vec![dir.path().join("build/conventions/orders.json")]
        );
    }

    #[test]
    fn test_strict_formatting_fails_build() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "src/main/java/Main.java", "class Main {}  \n");
        let project = compose(&[STRICT_FORMATTING]);

        let (summary, report) = run(&project, &layout(&dir), &Harness::new(), BUILD);
        assert_eq!(summary.exit_code(), 1);
        match summary.outcome(FORMAT_CHECK) {
            Some(TaskOutcome::Failed(Error::GateFailure { gate, violations })) => {
                assert_eq!(gate, "format-check:java-format");
                assert_eq!(violations[0].location, "src/main/java/Main.java");
            }
            other => panic!("expected format gate failure, got {other:?}"),
        }
        assert!(matches!(summary.outcome(BUILD), Some(TaskOutcome::Skipped { .. })));
        assert!(matches!(summary.outcome(ASSEMBLE), Some(TaskOutcome::Succeeded)));
        assert_eq!(report.gates.exit_code(), 1);
    }

    #[test]
    fn test_format_apply_then_build_passes() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "src/main/java/Main.java", "class Main {}  \n");
        write_source(&dir, "src/main/kotlin/App.kt", "fun main() {}\n");
        let project = compose(&[STRICT_FORMATTING]);
        let layout = layout(&dir);
        let tool = Harness::new();

        let (summary, report) = run(&project, &layout, &tool, FORMAT_APPLY);
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(
            report.modified_files,
            vec![PathBuf::from("src/main/java/Main.java")]
        );

        let (summary, _) = run(&project, &layout, &tool, BUILD);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_format_diff_reports_without_modifying() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "src/main/java/Main.java", "class Main {}  \n");
        let project = compose(&[STRICT_FORMATTING]);

        let (_, report) = run(&project, &layout(&dir), &Harness::new(), FORMAT_DIFF);
        assert_eq!(report.diffs.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/main/java/Main.java")).unwrap(),
            "class Main {}  \n"
        );
    }

    #[test]
    fn test_dependency_conflict_fails_build() {
        let dir = TempDir::new().unwrap();
        let mut project = compose(&[FRAMEWORK_WEB]);
        project.add_dependency(Scope::Implementation, "com.acme:json", Some("1.0"));
        project.add_dependency(Scope::Implementation, "com.acme:json", Some("1.1"));

        let (summary, _) = run(&project, &layout(&dir), &Harness::new(), BUILD);
        match summary.outcome(DEPENDENCY_CHECK) {
            Some(TaskOutcome::Failed(Error::GateFailure { violations, .. })) => {
                assert_eq!(violations[0].rule, dependency::DEPENDENCY_CONFLICT);
                assert_eq!(violations[0].location, "com.acme:json");
            }
            other => panic!("expected dependency gate failure, got {other:?}"),
        }
    }

    #[test]
    fn test_lenient_project_ignores_dynamic_versions() {
        let dir = TempDir::new().unwrap();
        let mut project = compose(&[units::BASE]);
        project.add_dependency(Scope::Implementation, "com.acme:json", Some("1.+"));

        let (summary, report) = run(&project, &layout(&dir), &Harness::new(), BUILD);
        assert_eq!(summary.exit_code(), 0);
        assert!(report.gates.is_empty());
    }

    #[test]
    fn test_test_is_finalized_by_coverage() {
        let dir = TempDir::new().unwrap();
        let project = compose(&[units::QUALITY_COVERAGE]);
        let tool = Harness::new();
        tool.coverage_violations.set(true);

        let (summary, report) = run(&project, &layout(&dir), &tool, TEST);
        assert_eq!(*tool.calls.borrow(), vec![TEST_TOOL, "jacoco"]);
        // Coverage is not enforced, so low coverage only warns
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(report.gates.warnings().count(), 1);
    }

    #[test]
    fn test_enforced_coverage_fails() {
        let dir = TempDir::new().unwrap();
        let mut project = compose(&[units::QUALITY_COVERAGE]);
        project.enforce_rules(RuleKind::Coverage);
        let tool = Harness::new();
        tool.coverage_violations.set(true);

        let (summary, _) = run(&project, &layout(&dir), &tool, TEST);
        assert!(matches!(summary.outcome(TEST), Some(TaskOutcome::Succeeded)));
        assert!(matches!(
            summary.outcome(COVERAGE_REPORT),
            Some(TaskOutcome::Failed(_))
        ));
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_publish_local_copies_descriptor() {
        let dir = TempDir::new().unwrap();
        let project = compose(&[units::BASE]);
        let layout = layout(&dir);

        let (summary, report) = run(&project, &layout, &Harness::new(), PUBLISH_LOCAL);
        assert_eq!(summary.exit_code(), 0);

        let published = dir
            .path()
            .join("repository/com.acme/orders/1.0.0/orders-1.0.0.json");
        assert_eq!(report.artifacts.last(), Some(&published));
        let copy: ProjectDescriptor =
            serde_json::from_str(&fs::read_to_string(published).unwrap()).unwrap();
        assert_eq!(copy, project);
    }

    #[test]
    fn test_publish_local_requires_coordinates() {
        let dir = TempDir::new().unwrap();
        let project = ProjectDescriptor::new("orders");

        let (summary, _) = run(&project, &layout(&dir), &Harness::new(), PUBLISH_LOCAL);
        assert!(matches!(
            summary.outcome(PUBLISH_LOCAL),
            Some(TaskOutcome::Failed(Error::ConfigParse { .. }))
        ));
    }

    #[test]
    fn test_clean_removes_build_dir() {
        let dir = TempDir::new().unwrap();
        let project = compose(&[units::BASE]);
        let layout = layout(&dir);
        run(&project, &layout, &Harness::new(), ASSEMBLE);
        assert!(layout.build_dir.exists());

        run(&project, &layout, &Harness::new(), CLEAN);
        assert!(!layout.build_dir.exists());
    }
}
