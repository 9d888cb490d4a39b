//! Property tests over randomly generated dependency graphs.
//!
//! Covers the structural guarantees the migration driver relies on:
//! - clusters partition the units exactly once
//! - the condensed graph is acyclic
//! - the frontier is exactly the set of unaccepted clusters whose
//!   dependencies are all accepted
//! - depth metrics strictly decrease along condensed edges

use std::collections::HashSet;
use std::path::PathBuf;

use proptest::prelude::*;

use ratchet_core::{
    compute_depths, eligible, AcceptedSet, ClusterId, Condensation, DependencyGraph, MapResolver,
};

/// A graph over `n` units named `u00`, `u01`, ... with arbitrary edges
/// (self-loops and overlapping cycles included).
fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..14).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..n * 3)))
}

fn name(i: usize) -> PathBuf {
    PathBuf::from(format!("u{:02}", i))
}

fn build(n: usize, edges: &[(usize, usize)]) -> (DependencyGraph, Condensation) {
    let mut resolver = MapResolver::new();
    for i in 0..n {
        let deps: Vec<PathBuf> = edges
            .iter()
            .filter(|(from, _)| *from == i)
            .map(|(_, to)| name(*to))
            .collect();
        resolver = resolver.with_unit(name(i), deps);
    }
    let graph = DependencyGraph::build((0..n).map(name), &resolver).unwrap();
    let condensation = Condensation::build(&graph).unwrap();
    (graph, condensation)
}

proptest! {
    #[test]
    fn clusters_partition_units((n, edges) in arb_graph()) {
        let (graph, c) = build(n, &edges);

        let mut seen = HashSet::new();
        for cluster in c.clusters() {
            prop_assert!(!cluster.members.is_empty());
            for unit in &cluster.members {
                prop_assert!(seen.insert(*unit), "unit {} in two clusters", unit);
                prop_assert_eq!(c.cluster_of(*unit), Some(cluster.id));
            }
        }
        prop_assert_eq!(seen.len(), graph.len());
    }

    #[test]
    fn condensed_graph_is_acyclic((n, edges) in arb_graph()) {
        let (_, c) = build(n, &edges);

        // Kahn's algorithm must consume every cluster.
        let mut indegree: Vec<usize> = c.clusters().iter().map(|cl| c.dependents(cl.id).len()).collect();
        let mut queue: Vec<ClusterId> = c
            .clusters()
            .iter()
            .filter(|cl| indegree[cl.id.index()] == 0)
            .map(|cl| cl.id)
            .collect();
        let mut visited = 0;
        while let Some(id) = queue.pop() {
            visited += 1;
            for dep in c.dependencies(id) {
                prop_assert_ne!(*dep, id);
                indegree[dep.index()] -= 1;
                if indegree[dep.index()] == 0 {
                    queue.push(*dep);
                }
            }
        }
        prop_assert_eq!(visited, c.len());
    }

    #[test]
    fn frontier_matches_definition(
        (n, edges) in arb_graph(),
        accepted_mask in prop::collection::vec(any::<bool>(), 14),
    ) {
        let (graph, c) = build(n, &edges);
        let accepted: AcceptedSet = (0..n).filter(|i| accepted_mask[*i]).map(name).collect();

        let frontier = eligible(&graph, &c, &accepted);
        let mut sorted = frontier.clone();
        sorted.sort();
        prop_assert_eq!(&frontier, &sorted);

        for cluster in c.clusters() {
            let done = accepted.is_cluster_accepted(&graph, &c, cluster.id);
            let deps_done = c
                .dependencies(cluster.id)
                .iter()
                .all(|d| accepted.is_cluster_accepted(&graph, &c, *d));
            prop_assert_eq!(frontier.contains(&cluster.id), !done && deps_done);
        }
    }

    #[test]
    fn depth_decreases_along_edges((n, edges) in arb_graph()) {
        let (_, c) = build(n, &edges);
        let depths = compute_depths(&c).unwrap();

        for cluster in c.clusters() {
            let here = depths[cluster.id.index()];
            if c.dependencies(cluster.id).is_empty() {
                prop_assert_eq!(here.dependency_depth, 0);
            }
            if c.dependents(cluster.id).is_empty() {
                prop_assert_eq!(here.dependent_depth, 0);
            }
            for dep in c.dependencies(cluster.id) {
                let there = depths[dep.index()];
                prop_assert!(here.dependency_depth > there.dependency_depth);
                prop_assert!(there.dependent_depth > here.dependent_depth);
            }
        }
    }
}
