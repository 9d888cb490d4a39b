//! Core error types for ratchet-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Everything in
//! here is fatal for a run; recoverable problems are reported as
//! [`GraphWarning`](crate::diagnostics::GraphWarning) instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::id::{ClusterId, UnitId};

/// Core errors produced by the ratchet-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The unit resolver could not produce a dependency list for a unit.
    #[error("failed to resolve dependencies of {}: {source}", .unit.display())]
    Resolve {
        unit: PathBuf,
        #[source]
        source: ResolveError,
    },

    /// A unit ID was not found in the graph.
    #[error("unit not found: UnitId({id})", id = id.0)]
    UnitNotFound { id: UnitId },

    /// A cluster ID was not found in the condensation.
    #[error("cluster not found: ClusterId({id})", id = id.0)]
    ClusterNotFound { id: ClusterId },

    /// The condensed graph is not acyclic. Only reachable through a defect in
    /// cluster decomposition.
    #[error("graph invariant violation: {reason}")]
    GraphInvariantViolation { reason: String },
}

/// Failure reported by a [`UnitResolver`](crate::graph::UnitResolver).
///
/// Individual unresolvable specifiers are not errors; they come back as
/// [`Dependency::Unresolved`](crate::graph::Dependency::Unresolved). This is
/// for failures to read the unit itself.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unit is not valid UTF-8")]
    InvalidUtf8,
}
