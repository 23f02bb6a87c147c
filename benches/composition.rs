//! Benchmarks for composition planning and application.
//!
//! These benchmarks measure applying the built-in units to a fresh
//! descriptor, and how planning scales with the depth and width of the
//! prerequisite graph.

use conventions::descriptor::{ProjectDescriptor, Scope};
use conventions::engine::CompositionEngine;
use conventions::properties::PropertyMap;
use conventions::registry::{ConventionUnit, UnitRegistry};
use conventions::units::{self, builtin_registry};
use conventions::versions::Versions;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn versions() -> Versions {
    let properties: PropertyMap = [
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
    .collect();
    Versions::from_properties(&properties).expect("complete properties")
}

/// A layered registry: every unit of layer `n` requires every unit of layer
/// `n - 1`.
fn layered_registry(layers: usize, width: usize) -> UnitRegistry {
    let mut registry = UnitRegistry::new();
    for layer in 0..layers {
        let below: Vec<String> = if layer == 0 {
            Vec::new()
        } else {
            (0..width)
                .map(|i| format!("l{}u{}", layer - 1, i))
                .collect()
        };
        let below: Vec<&str> = below.iter().map(String::as_str).collect();
        for i in 0..width {
            let name = format!("l{}u{}", layer, i);
            let coordinate = format!("bench:{}", name);
            let unit = ConventionUnit::new(&name, move |project, _| {
                project.add_dependency(Scope::Implementation, &coordinate, None);
                Ok(())
            })
            .requires(&below);
            registry.register(unit).expect("unique names");
        }
    }
    registry
}

fn bench_builtin_units(c: &mut Criterion) {
    let registry = builtin_registry().expect("builtin registry");
    let versions = versions();
    let engine = CompositionEngine::new(&registry, &versions);
    let mut group = c.benchmark_group("builtin_units");

    group.bench_function("plan_framework_web", |b| {
        let project = ProjectDescriptor::new("orders");
        b.iter(|| engine.plan(black_box(&project), units::FRAMEWORK_WEB))
    });

    group.bench_function("apply_full_stack", |b| {
        b.iter(|| {
            let mut project = ProjectDescriptor::new("orders");
            let stack = [
                units::FRAMEWORK_WEB,
                units::STRICT_FORMATTING,
                units::QUALITY_COVERAGE,
            ];
            engine.apply_all(&mut project, black_box(&stack))
        })
    });

    group.finish();
}

fn bench_plan_scaling(c: &mut Criterion) {
    let versions = versions();
    let mut group = c.benchmark_group("plan_scaling");

    for layers in [2, 8, 32] {
        let registry = layered_registry(layers, 4);
        let engine = CompositionEngine::new(&registry, &versions);
        let top = format!("l{}u0", layers - 1);
        group.bench_with_input(BenchmarkId::new("layers", layers), &top, |b, top| {
            let project = ProjectDescriptor::new("bench");
            b.iter(|| engine.plan(black_box(&project), top))
        });
    }

    for width in [4, 16, 64] {
        let registry = layered_registry(4, width);
        let engine = CompositionEngine::new(&registry, &versions);
        group.bench_with_input(BenchmarkId::new("width", width), &"l3u0", |b, top| {
            let project = ProjectDescriptor::new("bench");
            b.iter(|| engine.plan(black_box(&project), top))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_builtin_units, bench_plan_scaling);
criterion_main!(benches);
