//! Stable ID newtypes for units and clusters.
//!
//! Both IDs are distinct newtype wrappers over `u32`, so that a `UnitId`
//! cannot be accidentally used where a `ClusterId` is expected. IDs are
//! assigned in canonical (ascending path) order, which makes every ordering
//! derived from them reproducible across runs.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Dense identifier of a compilation unit inside a [`DependencyGraph`].
///
/// Maps to a petgraph `NodeIndex<u32>`.
///
/// [`DependencyGraph`]: crate::graph::DependencyGraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Identifier of a cluster (strongly connected component) in a
/// [`Condensation`].
///
/// [`Condensation`]: crate::cluster::Condensation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterId(pub u32);

impl UnitId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ClusterId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridge between UnitId and petgraph's NodeIndex<u32>.

impl From<NodeIndex<u32>> for UnitId {
    fn from(idx: NodeIndex<u32>) -> Self {
        UnitId(idx.index() as u32)
    }
}

impl From<UnitId> for NodeIndex<u32> {
    fn from(id: UnitId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}
