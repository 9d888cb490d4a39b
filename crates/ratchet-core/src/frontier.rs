//! The accepted set and eligibility frontier.
//!
//! A cluster is *eligible* when it is not fully accepted yet and every
//! cluster it directly depends on is fully accepted. The frontier is derived
//! state: it is recomputed from scratch whenever the accepted set changes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::cluster::Condensation;
use crate::graph::DependencyGraph;
use crate::id::ClusterId;

/// Units that have passed validation or were accepted before the run.
///
/// Only grows: there is no removal API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptedSet {
    units: BTreeSet<PathBuf>,
}

impl AcceptedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit. Returns `false` if it was already accepted.
    pub fn insert(&mut self, unit: impl Into<PathBuf>) -> bool {
        self.units.insert(unit.into())
    }

    pub fn contains(&self, unit: &Path) -> bool {
        self.units.contains(unit)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Accepted units in ascending path order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.units.iter().map(PathBuf::as_path)
    }

    /// Whether every member of `cluster` is accepted.
    ///
    /// Unknown clusters are never accepted.
    pub fn is_cluster_accepted(
        &self,
        graph: &DependencyGraph,
        condensation: &Condensation,
        cluster: ClusterId,
    ) -> bool {
        match condensation.cluster(cluster) {
            Some(c) => c
                .members
                .iter()
                .all(|&unit| graph.path(unit).is_some_and(|p| self.contains(p))),
            None => false,
        }
    }

    /// Number of in-graph units that are accepted.
    pub fn count_in(&self, graph: &DependencyGraph) -> usize {
        graph
            .units()
            .filter_map(|u| graph.path(u))
            .filter(|p| self.contains(p))
            .count()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for AcceptedSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        AcceptedSet {
            units: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<P: Into<PathBuf>> Extend<P> for AcceptedSet {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.units.extend(iter.into_iter().map(Into::into));
    }
}

/// Computes the eligibility frontier.
///
/// The result is sorted by [`ClusterId`], which is the stable visitation
/// order for validation.
pub fn eligible(
    graph: &DependencyGraph,
    condensation: &Condensation,
    accepted: &AcceptedSet,
) -> Vec<ClusterId> {
    let fully_accepted: Vec<bool> = condensation
        .clusters()
        .iter()
        .map(|c| accepted.is_cluster_accepted(graph, condensation, c.id))
        .collect();

    condensation
        .clusters()
        .iter()
        .filter(|c| !fully_accepted[c.id.index()])
        .filter(|c| {
            condensation
                .dependencies(c.id)
                .iter()
                .all(|dep| fully_accepted[dep.index()])
        })
        .map(|c| c.id)
        .collect()
}
