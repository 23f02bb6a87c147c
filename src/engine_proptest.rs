//! Property-based tests for the composition engine.
//!
//! Random acyclic registries are generated by letting unit `i` require only
//! units with a lower index, so every generated graph is a DAG.

#[cfg(test)]
mod proptest_tests {
    use std::collections::HashSet;

    use crate::descriptor::{ProjectDescriptor, Scope};
    use crate::engine::CompositionEngine;
    use crate::registry::{ConventionUnit, UnitRegistry};
    use crate::versions::fixtures::sample_versions;
    use proptest::prelude::*;

    const MAX_UNITS: usize = 8;

    fn unit_name(index: usize) -> String {
        format!("u{}", index)
    }

    /// Edge matrix: `edges[i][j]` with `j < i` means unit `i` requires unit `j`.
    fn dag() -> impl Strategy<Value = Vec<Vec<bool>>> {
        prop::collection::vec(
            prop::collection::vec(any::<bool>(), MAX_UNITS),
            1..=MAX_UNITS,
        )
    }

    fn prerequisites_of(edges: &[Vec<bool>], index: usize) -> Vec<String> {
        (0..index)
            .filter(|&j| edges[index][j])
            .map(unit_name)
            .collect()
    }

    fn build_registry(edges: &[Vec<bool>]) -> UnitRegistry {
        let mut registry = UnitRegistry::new();
        for index in 0..edges.len() {
            let name = unit_name(index);
            let coordinate = format!("test:{}", name);
            let prerequisites = prerequisites_of(edges, index);
            let prerequisites: Vec<&str> = prerequisites.iter().map(String::as_str).collect();
            let unit = ConventionUnit::new(&name, move |project, _| {
                project.add_dependency(Scope::Implementation, &coordinate, None);
                Ok(())
            })
            .requires(&prerequisites);
            registry.register(unit).unwrap();
        }
        registry
    }

    fn closure(edges: &[Vec<bool>], index: usize, into: &mut HashSet<String>) {
        if into.insert(unit_name(index)) {
            for j in (0..index).filter(|&j| edges[index][j]) {
                closure(edges, j, into);
            }
        }
    }

    proptest! {
        /// Property: planning twice yields the same order
        #[test]
        fn plan_is_deterministic(edges in dag(), pick in any::<prop::sample::Index>()) {
            let registry = build_registry(&edges);
            let versions = sample_versions();
            let engine = CompositionEngine::new(&registry, &versions);
            let project = ProjectDescriptor::new("p");
            let target = unit_name(pick.index(edges.len()));

            let first = engine.plan(&project, &target).unwrap();
            let second = engine.plan(&project, &target).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: the plan holds the transitive prerequisites exactly once,
        /// each before every unit that requires it, and ends with the target
        #[test]
        fn plan_orders_prerequisites_first(edges in dag(), pick in any::<prop::sample::Index>()) {
            let registry = build_registry(&edges);
            let versions = sample_versions();
            let engine = CompositionEngine::new(&registry, &versions);
            let project = ProjectDescriptor::new("p");
            let index = pick.index(edges.len());
            let target = unit_name(index);

            let plan = engine.plan(&project, &target).unwrap();

            let mut expected = HashSet::new();
            closure(&edges, index, &mut expected);
            let planned: HashSet<String> = plan.iter().map(|s| s.to_string()).collect();
            prop_assert_eq!(planned.len(), plan.len(), "plan has duplicates: {:?}", plan);
            prop_assert_eq!(planned, expected);
            prop_assert_eq!(plan.last().copied(), Some(target.as_str()));

            for (position, name) in plan.iter().enumerate() {
                let unit_index: usize = name[1..].parse().unwrap();
                for prerequisite in prerequisites_of(&edges, unit_index) {
                    let before = plan.iter().position(|p| *p == prerequisite).unwrap();
                    prop_assert!(
                        before < position,
                        "'{}' planned after '{}' in {:?}",
                        prerequisite,
                        name,
                        plan
                    );
                }
            }
        }

        /// Property: applying the same unit twice changes nothing the second time
        #[test]
        fn apply_is_idempotent(edges in dag(), pick in any::<prop::sample::Index>()) {
            let registry = build_registry(&edges);
            let versions = sample_versions();
            let engine = CompositionEngine::new(&registry, &versions);
            let mut project = ProjectDescriptor::new("p");
            let target = unit_name(pick.index(edges.len()));

            let plan: Vec<String> = engine
                .plan(&project, &target)
                .unwrap()
                .into_iter()
                .map(str::to_string)
                .collect();
            let applied = engine.apply(&mut project, &target).unwrap();
            prop_assert_eq!(&applied, &plan);
            prop_assert_eq!(project.dependencies().len(), plan.len());

            let snapshot = project.clone();
            let again = engine.apply(&mut project, &target).unwrap();
            prop_assert!(again.is_empty());
            prop_assert_eq!(project, snapshot);
        }

        /// Property: applying every unit in any order applies each exactly once
        #[test]
        fn apply_all_applies_each_unit_once(edges in dag(), reverse in any::<bool>()) {
            let registry = build_registry(&edges);
            let versions = sample_versions();
            let engine = CompositionEngine::new(&registry, &versions);
            let mut project = ProjectDescriptor::new("p");

            let mut requested: Vec<String> = (0..edges.len()).map(unit_name).collect();
            if reverse {
                requested.reverse();
            }
            let applied = engine.apply_all(&mut project, &requested).unwrap();

            prop_assert_eq!(applied.len(), edges.len());
            prop_assert_eq!(project.applied_units().len(), edges.len());
        }
    }
}
