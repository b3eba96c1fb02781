//! Property-based tests for registry ordering.

use super::registry::{MigrationRegistry, Requirement};
use proptest::prelude::*;

// Each entry lists indices of earlier entries it requires.
fn plan_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..25).prop_flat_map(|len| {
        (0..len)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::vec(0..i, 0..4).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn build(plan: &[Vec<usize>]) -> MigrationRegistry {
    let mut registry = MigrationRegistry::new();
    for (i, requires) in plan.iter().enumerate() {
        let requires: Vec<Requirement> = requires.iter().map(|r| format!("m{r}").into()).collect();
        registry
            .register_with_requires(format!("m{i}"), requires, |_| Ok(true))
            .unwrap();
    }
    registry
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        .. ProptestConfig::default()
    })]

    // Every dependency runs before its dependents
    #[test]
    fn dependencies_precede_dependents(plan in plan_strategy()) {
        let registry = build(&plan);
        let names = registry.names();
        let position = |name: &str| names.iter().position(|n| *n == name).unwrap();

        for (i, requires) in plan.iter().enumerate() {
            let me = position(&format!("m{i}"));
            for r in requires {
                let dependency = format!("m{r}");
                prop_assert!(position(&dependency) < me);
            }
        }
    }

    // Every registration lands exactly once
    #[test]
    fn registrations_are_kept(plan in plan_strategy()) {
        let registry = build(&plan);
        prop_assert_eq!(registry.len(), plan.len());
        for i in 0..plan.len() {
            let name = format!("m{i}");
            prop_assert!(registry.has(&name));
        }
    }

    // Without requirements the order is registration order
    #[test]
    fn plain_registrations_append(len in 1usize..40) {
        let plan = vec![Vec::new(); len];
        let registry = build(&plan);
        let expected: Vec<String> = (0..len).map(|i| format!("m{i}")).collect();
        let names: Vec<String> = registry.names().into_iter().map(str::to_string).collect();
        prop_assert_eq!(names, expected);
    }

    // A failed registration never changes the order
    #[test]
    fn unknown_dependency_is_rejected(plan in plan_strategy()) {
        let mut registry = build(&plan);
        let before: Vec<String> = registry.names().into_iter().map(str::to_string).collect();

        let result = registry.register_with_requires("late", ["m0", "ghost"], |_| Ok(true));
        prop_assert!(result.is_err());
        let after: Vec<String> = registry.names().into_iter().map(str::to_string).collect();
        prop_assert_eq!(before, after);
    }
}
