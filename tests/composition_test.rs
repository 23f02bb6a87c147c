//! Integration tests for composition and version resolution through the
//! public library API.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::thread;

use conventions::artifact::{FileArtifactStore, MemoryArtifactStore};
use conventions::descriptor::{ProjectDescriptor, Scope};
use conventions::engine::CompositionEngine;
use conventions::error::Error;
use conventions::properties::{PropertyMap, PropertySource};
use conventions::registry::{ConventionUnit, UnitRegistry};
use conventions::units::{self, builtin_registry};
use conventions::versions::{GenerationStatus, VersionRegistry, Versions, REQUIRED_KEYS};
use tempfile::TempDir;

fn complete_properties() -> PropertyMap {
    [
        ("javaVersion", "17"),
        ("coreVersion", "2.4.1"),
        ("frameworkVersion", "3.2.5"),
        ("dependencyManagementVersion", "1.1.4"),
        ("googleJavaFormatVersion", "1.22.0"),
        ("ktlintVersion", "1.2.1"),
        ("jacocoVersion", "0.8.12"),
        ("junitVersion", "5.10.2"),
        ("mockitoVersion", "5.11.0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn versions() -> Versions {
    Versions::from_properties(&complete_properties()).unwrap()
}

/// Registry of three units shaped like the built-in ones, each declaring one
/// test-scope and one implementation-scope dependency.
fn scenario_registry() -> UnitRegistry {
    let unit = |name: &str, prerequisites: &[&str]| {
        let test = format!("test:{}-test", name);
        let implementation = format!("test:{}", name);
        ConventionUnit::new(name, move |project, _| {
            project.add_dependency(Scope::TestImplementation, &test, None);
            project.add_dependency(Scope::Implementation, &implementation, Some("1.0"));
            Ok(())
        })
        .requires(prerequisites)
    };

    let mut registry = UnitRegistry::new();
    registry.register(unit("base", &[])).unwrap();
    registry.register(unit("testSupport", &["base"])).unwrap();
    registry
        .register(unit("frameworkCore", &["base", "testSupport"]))
        .unwrap();
    registry
}

#[test]
fn test_prerequisites_compose_before_dependents() {
    let registry = scenario_registry();
    let versions = versions();
    let engine = CompositionEngine::new(&registry, &versions);
    let mut project = ProjectDescriptor::new("orders");

    let applied = engine.apply(&mut project, "frameworkCore").unwrap();

    assert_eq!(applied, vec!["base", "testSupport", "frameworkCore"]);
    assert_eq!(project.applied_units(), applied.as_slice());
    for name in ["base", "testSupport", "frameworkCore"] {
        let has = |scope: Scope, coordinate: String| {
            project
                .dependencies()
                .iter()
                .any(|d| d.scope == scope && d.coordinate == coordinate)
        };
        assert!(has(Scope::TestImplementation, format!("test:{}-test", name)));
        assert!(has(Scope::Implementation, format!("test:{}", name)));
    }
}

#[test]
fn test_cycle_is_rejected_before_anything_applies() {
    let mut registry = UnitRegistry::new();
    registry
        .register(ConventionUnit::new("a", |_, _| Ok(())).requires(&["b"]))
        .unwrap();
    registry
        .register(ConventionUnit::new("b", |_, _| Ok(())).requires(&["a"]))
        .unwrap();
    let versions = versions();
    let engine = CompositionEngine::new(&registry, &versions);
    let mut project = ProjectDescriptor::new("orders");

    let err = engine.apply(&mut project, "a").unwrap_err();

    match err {
        Error::CyclicDependency { cycle } => {
            assert!(cycle.contains('a') && cycle.contains('b'), "cycle was {cycle}");
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
    assert!(project.applied_units().is_empty());
}

#[test]
fn test_self_cycle_is_rejected() {
    let mut registry = UnitRegistry::new();
    registry
        .register(ConventionUnit::new("loop", |_, _| Ok(())).requires(&["loop"]))
        .unwrap();
    let versions = versions();
    let engine = CompositionEngine::new(&registry, &versions);
    let mut project = ProjectDescriptor::new("orders");

    let err = engine.apply(&mut project, "loop").unwrap_err();
    assert!(matches!(err, Error::CyclicDependency { cycle } if cycle == "loop -> loop"));
    assert!(project.applied_units().is_empty());
}

#[test]
fn test_missing_core_version_writes_no_artifact() {
    let mut properties = complete_properties();
    properties.remove("coreVersion");
    let source = PropertySource::from_map("conventions.properties", properties);
    let registry = VersionRegistry::new(MemoryArtifactStore::new());

    let err = registry.resolve(&source).unwrap_err();

    assert!(matches!(err, Error::MissingVersionProperty { key } if key == "coreVersion"));
    assert_eq!(registry.store().writes(), 0);
    assert_eq!(registry.store().contents(), None);
}

#[test]
fn test_every_required_key_is_checked() {
    for key in REQUIRED_KEYS {
        let mut properties = complete_properties();
        properties.remove(key);
        let err = Versions::from_properties(&properties).unwrap_err();
        assert!(
            matches!(&err, Error::MissingVersionProperty { key: missing } if missing == key),
            "removing {key} gave {err:?}"
        );
    }
}

#[test]
fn test_unchanged_properties_regenerate_once() {
    let source = PropertySource::from_map("conventions.properties", complete_properties());
    let registry = VersionRegistry::new(MemoryArtifactStore::new());

    let first = registry.resolve(&source).unwrap();
    let second = registry.resolve(&source).unwrap();

    assert_eq!(first.status, GenerationStatus::Regenerated);
    assert_eq!(second.status, GenerationStatus::Fresh);
    assert_eq!(first.versions, second.versions);
    assert_eq!(registry.store().writes(), 1);
}

#[test]
fn test_changed_property_regenerates_again() {
    let registry = VersionRegistry::new(MemoryArtifactStore::new());
    registry
        .resolve(&PropertySource::from_map("p", complete_properties()))
        .unwrap();

    let mut bumped = complete_properties();
    bumped.insert("junitVersion".to_string(), "5.11.0".to_string());
    let resolution = registry
        .resolve(&PropertySource::from_map("p", bumped))
        .unwrap();

    assert_eq!(resolution.status, GenerationStatus::Regenerated);
    assert_eq!(resolution.versions.junit_version, "5.11.0");
    assert_eq!(registry.store().writes(), 2);
}

#[test]
fn test_concurrent_resolves_regenerate_exactly_once() {
    let dir = TempDir::new().unwrap();
    let artifact = Arc::new(dir.path().join(".conventions/versions.generated.toml"));
    fs::create_dir_all(artifact.parent().unwrap()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let artifact = Arc::clone(&artifact);
            thread::spawn(move || {
                let registry = VersionRegistry::new(FileArtifactStore::new(artifact.as_path()));
                let source = PropertySource::from_map("p", complete_properties());
                registry.resolve(&source).unwrap().status
            })
        })
        .collect();

    let statuses: Vec<GenerationStatus> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let regenerated = statuses
        .iter()
        .filter(|s| **s == GenerationStatus::Regenerated)
        .count();
    assert_eq!(regenerated, 1, "statuses: {statuses:?}");
    assert!(artifact.exists());
}

#[test]
fn test_web_and_reactive_are_mutually_exclusive() {
    let registry = builtin_registry().unwrap();
    let versions = versions();
    let engine = CompositionEngine::new(&registry, &versions);
    let mut project = ProjectDescriptor::new("orders");

    engine.apply(&mut project, units::FRAMEWORK_WEB).unwrap();
    let snapshot = project.clone();
    let err = engine
        .apply(&mut project, units::FRAMEWORK_REACTIVE)
        .unwrap_err();

    assert!(matches!(err, Error::MutuallyExclusiveUnits { .. }));
    assert_eq!(project, snapshot);
}

#[test]
fn test_builtin_units_compose_a_complete_descriptor() {
    let registry = builtin_registry().unwrap();
    let versions = versions();
    let engine = CompositionEngine::new(&registry, &versions);
    let mut project = ProjectDescriptor::new("orders");

    let stack = [
        units::FRAMEWORK_WEB,
        units::STRICT_FORMATTING,
        units::QUALITY_COVERAGE,
    ];
    engine.apply_all(&mut project, &stack).unwrap();

    assert_eq!(project.toolchain_version(), Some(17));
    assert!(project.resolution_policy().is_strict());
    let enforced: BTreeMap<&str, bool> = project
        .format_rules()
        .map(|(key, rule)| (key, rule.enforced))
        .collect();
    assert_eq!(
        enforced,
        BTreeMap::from([
            (units::quality::JAVA_FORMAT, true),
            (units::quality::KOTLIN_FORMAT, true),
        ])
    );
    assert!(!project.quality_rule(units::quality::COVERAGE).unwrap().enforced);
}
