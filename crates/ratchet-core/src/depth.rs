//! Longest-path depth metrics over the condensed graph.
//!
//! Used for diagnostics and visualization ranking only. Nothing in the
//! migration driver reads these values.

use serde::{Deserialize, Serialize};

use crate::cluster::Condensation;
use crate::error::CoreError;
use crate::id::ClusterId;

/// Depth of one cluster in the condensed DAG, counted in cluster hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthMetrics {
    /// Longest chain of dependencies below this cluster. 0 when it has none.
    pub dependency_depth: u32,
    /// Longest chain of dependents above this cluster. 0 when nothing
    /// depends on it.
    pub dependent_depth: u32,
}

/// Computes [`DepthMetrics`] for every cluster, indexed by [`ClusterId`].
pub fn compute_depths(condensation: &Condensation) -> Result<Vec<DepthMetrics>, CoreError> {
    let dependency = layer(condensation, |id| condensation.dependencies(id))?;
    let dependent = layer(condensation, |id| condensation.dependents(id))?;

    Ok(dependency
        .into_iter()
        .zip(dependent)
        .map(|(dependency_depth, dependent_depth)| DepthMetrics {
            dependency_depth,
            dependent_depth,
        })
        .collect())
}

/// Iterative layering: each round assigns the current depth to every
/// remaining cluster whose neighbours were all assigned in earlier rounds.
fn layer<'c, F>(condensation: &'c Condensation, neighbours: F) -> Result<Vec<u32>, CoreError>
where
    F: Fn(ClusterId) -> &'c [ClusterId],
{
    let mut depth: Vec<Option<u32>> = vec![None; condensation.len()];
    let mut remaining: Vec<ClusterId> = condensation.clusters().iter().map(|c| c.id).collect();
    let mut current = 0u32;

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<ClusterId>, Vec<ClusterId>) =
            remaining.into_iter().partition(|&id| {
                neighbours(id)
                    .iter()
                    .all(|n| depth.get(n.index()).copied().flatten().is_some())
            });

        if ready.is_empty() {
            return Err(CoreError::GraphInvariantViolation {
                reason: format!(
                    "depth layering stalled at layer {} with {} clusters left",
                    current,
                    blocked.len()
                ),
            });
        }

        for id in ready {
            depth[id.index()] = Some(current);
        }
        remaining = blocked;
        current += 1;
    }

    Ok(depth.into_iter().map(|d| d.unwrap_or(0)).collect())
}
