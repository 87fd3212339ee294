//! Property-based tests for the dependency graph.
//!
//! Random link tables over the real entity kinds check that ordering and
//! preservation rules hold for any acyclic graph, not only the declared one.

use std::collections::BTreeSet;

use proptest::prelude::*;
use tradeflow::{
    errors::ServiceError,
    lifecycle::{DependencyGraph, EntityKind, ParentLink},
};

const COLUMNS: [&str; 4] = ["ref_a_id", "ref_b_id", "ref_c_id", "ref_d_id"];

fn kinds() -> Vec<EntityKind> {
    EntityKind::all().collect()
}

// Links always point from a later-declared kind to an earlier one, so the
// generated graph is acyclic.
fn acyclic_links_strategy() -> impl Strategy<Value = Vec<(EntityKind, ParentLink)>> {
    let n = EntityKind::all().count();
    prop::collection::vec((1..n, any::<prop::sample::Index>(), any::<bool>(), 0..COLUMNS.len()), 0..40)
        .prop_map(|raw| {
            let kinds = kinds();
            raw.into_iter()
                .map(|(child, parent, nullable, column)| {
                    let parent = parent.index(child);
                    (
                        kinds[child],
                        ParentLink {
                            parent: kinds[parent],
                            column: COLUMNS[column],
                            nullable,
                        },
                    )
                })
                .collect()
        })
}

fn kind_set_strategy() -> impl Strategy<Value = BTreeSet<EntityKind>> {
    prop::sample::subsequence(kinds(), 0..=EntityKind::all().count())
        .prop_map(|kinds| kinds.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn acyclic_graphs_order_children_before_parents(links in acyclic_links_strategy()) {
        let graph = DependencyGraph::from_links(links.clone()).unwrap();
        let order = graph.deletion_order();
        prop_assert_eq!(order.len(), EntityKind::all().count());

        let unique: BTreeSet<_> = order.iter().collect();
        prop_assert_eq!(unique.len(), order.len());

        for (child, link) in &links {
            let c = order.iter().position(|k| k == child).unwrap();
            let p = order.iter().position(|k| *k == link.parent).unwrap();
            prop_assert!(c < p, "{} ordered after its parent {}", child, link.parent);
            prop_assert!(graph.height(*child) < graph.height(link.parent));
        }
    }

    #[test]
    fn closure_is_the_smallest_valid_preservation_set(
        links in acyclic_links_strategy(),
        seed in kind_set_strategy(),
    ) {
        let graph = DependencyGraph::from_links(links).unwrap();
        let closure = graph.preservation_closure(&seed);

        prop_assert!(closure.is_superset(&seed));
        prop_assert!(graph.validate_preservation(&closure).is_ok());
        prop_assert_eq!(graph.preservation_closure(&closure), closure.clone());

        // A set is valid exactly when it is already closed.
        prop_assert_eq!(graph.validate_preservation(&seed).is_ok(), closure == seed);
    }

    #[test]
    fn detachments_only_name_nullable_links_into_the_preserved_set(
        links in acyclic_links_strategy(),
        keep in kind_set_strategy(),
    ) {
        let graph = DependencyGraph::from_links(links).unwrap();
        for kind in EntityKind::all().filter(|k| !keep.contains(k)) {
            for link in graph.detachments(kind, &keep) {
                prop_assert!(link.nullable);
                prop_assert!(keep.contains(&link.child));
            }
        }
    }

    #[test]
    fn a_back_link_closes_a_cycle(
        links in acyclic_links_strategy(),
        a in 0..EntityKind::all().count(),
        b in 0..EntityKind::all().count(),
    ) {
        prop_assume!(a != b);
        let kinds = kinds();
        let (child, parent) = (kinds[a.max(b)], kinds[a.min(b)]);

        let mut links = links;
        links.push((child, ParentLink { parent, column: "ref_a_id", nullable: false }));
        links.push((parent, ParentLink { parent: child, column: "ref_b_id", nullable: true }));

        let result = DependencyGraph::from_links(links);
        prop_assert!(matches!(result, Err(ServiceError::DependencyCycle(_))));
    }
}
