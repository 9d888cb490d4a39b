//! Language-agnostic core of the ratchet migration engine.
//!
//! # Modules
//!
//! - [`id`] -- `UnitId` / `ClusterId` newtypes
//! - [`graph`] -- unit dependency graph and the `UnitResolver` seam
//! - [`cluster`] -- SCC decomposition and the condensed DAG
//! - [`frontier`] -- accepted set and eligibility frontier
//! - [`depth`] -- longest-path depth metrics for diagnostics
//! - [`diagnostics`] -- non-fatal graph warnings
//! - [`error`] -- fatal error types

pub mod cluster;
pub mod depth;
pub mod diagnostics;
pub mod error;
pub mod frontier;
pub mod graph;
pub mod id;

// Re-export commonly used types
pub use cluster::{Cluster, Condensation};
pub use depth::{compute_depths, DepthMetrics};
pub use diagnostics::GraphWarning;
pub use error::{CoreError, ResolveError};
pub use frontier::{eligible, AcceptedSet};
pub use graph::{Dependency, DependencyGraph, MapResolver, UnitResolver};
pub use id::{ClusterId, UnitId};
