//! Cluster collapsing: strongly connected components and the condensed DAG.
//!
//! [`Condensation::build`] runs Tarjan's algorithm over the
//! [`DependencyGraph`] and contracts every strongly connected component into
//! a [`Cluster`]. Singleton units are clusters of size one; nothing
//! downstream distinguishes them.
//!
//! Clusters are numbered in ascending order of their smallest member path,
//! which is the stable visitation order used by the frontier.

use std::path::Path;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::DiGraph;

use crate::error::CoreError;
use crate::graph::DependencyGraph;
use crate::id::{ClusterId, UnitId};

/// One strongly connected component of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: ClusterId,
    /// Member units, sorted ascending. Never empty.
    pub members: Vec<UnitId>,
}

impl Cluster {
    /// Whether this cluster is an actual import cycle (more than one unit).
    pub fn is_cycle(&self) -> bool {
        self.members.len() > 1
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The partition of all units into clusters together with the condensed,
/// acyclic cluster graph.
#[derive(Debug, Clone)]
pub struct Condensation {
    clusters: Vec<Cluster>,
    /// `unit_cluster[unit]` is the cluster containing `unit`.
    unit_cluster: Vec<ClusterId>,
    /// Direct condensed dependencies per cluster, sorted.
    dependencies: Vec<Vec<ClusterId>>,
    /// Direct condensed dependents per cluster, sorted.
    dependents: Vec<Vec<ClusterId>>,
}

impl Condensation {
    /// Decomposes `graph` into clusters and builds the condensed graph.
    ///
    /// Returns [`CoreError::GraphInvariantViolation`] if the condensed graph
    /// turns out to be cyclic.
    pub fn build(graph: &DependencyGraph) -> Result<Self, CoreError> {
        let mut components: Vec<Vec<UnitId>> = tarjan_scc(graph.inner())
            .into_iter()
            .map(|scc| {
                let mut members: Vec<UnitId> = scc.into_iter().map(UnitId::from).collect();
                members.sort();
                members
            })
            .collect();
        // Unit IDs follow path order, so the first member is the smallest path.
        components.sort_by_key(|members| members[0]);

        let mut unit_cluster = vec![ClusterId(0); graph.len()];
        let clusters: Vec<Cluster> = components
            .into_iter()
            .enumerate()
            .map(|(i, members)| {
                let id = ClusterId(i as u32);
                for unit in &members {
                    unit_cluster[unit.index()] = id;
                }
                Cluster { id, members }
            })
            .collect();

        let mut dependencies: Vec<Vec<ClusterId>> = vec![Vec::new(); clusters.len()];
        let mut dependents: Vec<Vec<ClusterId>> = vec![Vec::new(); clusters.len()];
        for unit in graph.units() {
            let from = unit_cluster[unit.index()];
            for dep in graph.dependencies(unit) {
                let to = unit_cluster[dep.index()];
                if from != to {
                    dependencies[from.index()].push(to);
                    dependents[to.index()].push(from);
                }
            }
        }
        for list in dependencies.iter_mut().chain(dependents.iter_mut()) {
            list.sort();
            list.dedup();
        }

        let condensation = Condensation {
            clusters,
            unit_cluster,
            dependencies,
            dependents,
        };
        condensation.verify_acyclic()?;
        Ok(condensation)
    }

    /// Confirms that the condensed graph is a DAG.
    fn verify_acyclic(&self) -> Result<(), CoreError> {
        let mut dag = DiGraph::<ClusterId, (), u32>::with_capacity(self.clusters.len(), 0);
        for cluster in &self.clusters {
            dag.add_node(cluster.id);
        }
        for (from, deps) in self.dependencies.iter().enumerate() {
            for to in deps {
                dag.add_edge((from as u32).into(), (to.0).into(), ());
            }
        }
        toposort(&dag, None).map(|_| ()).map_err(|cycle| {
            let at = dag[cycle.node_id()];
            CoreError::GraphInvariantViolation {
                reason: format!("condensed graph contains a cycle through cluster {}", at),
            }
        })
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// All clusters, indexed by [`ClusterId`].
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.index())
    }

    /// The cluster containing `unit`.
    pub fn cluster_of(&self, unit: UnitId) -> Option<ClusterId> {
        self.unit_cluster.get(unit.index()).copied()
    }

    /// Direct condensed dependencies of `id`.
    pub fn dependencies(&self, id: ClusterId) -> &[ClusterId] {
        self.dependencies
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Clusters that directly depend on `id`.
    pub fn dependents(&self, id: ClusterId) -> &[ClusterId] {
        self.dependents
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Member paths of a cluster, in member order.
    pub fn member_paths<'g>(
        &self,
        graph: &'g DependencyGraph,
        id: ClusterId,
    ) -> Result<Vec<&'g Path>, CoreError> {
        let cluster = self.cluster(id).ok_or(CoreError::ClusterNotFound { id })?;
        cluster
            .members
            .iter()
            .map(|&unit| graph.path(unit).ok_or(CoreError::UnitNotFound { id: unit }))
            .collect()
    }

    /// Clusters with more than one member.
    pub fn cycles(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(|c| c.is_cycle())
    }
}
