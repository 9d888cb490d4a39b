//! Non-fatal graph construction diagnostics.
//!
//! [`GraphWarning`] records every dependency that was dropped or
//! approximated while building the [`DependencyGraph`]. Warnings are logged
//! through `tracing` as they occur and kept on the graph so callers can
//! summarize them afterwards.
//!
//! [`DependencyGraph`]: crate::graph::DependencyGraph

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A dependency that could not be kept as a precise edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphWarning {
    /// The specifier could not be mapped to any file.
    #[error("unresolved import '{specifier}' in {}", .unit.display())]
    UnresolvedDependency {
        /// The importing unit.
        unit: PathBuf,
        /// The specifier as written (or its root-joined form).
        specifier: String,
    },

    /// The specifier resolved to a file that is not an in-scope unit.
    #[error("import of out-of-scope file {} in {}", .target.display(), .unit.display())]
    OutOfScopeDependency {
        /// The importing unit.
        unit: PathBuf,
        /// The resolved file that is not part of the graph.
        target: PathBuf,
    },

    /// The specifier named a directory and was folded into a dependency on
    /// its aggregating index unit.
    #[error("barrel import of {} in {}", .directory.display(), .unit.display())]
    BarrelDependency {
        /// The importing unit.
        unit: PathBuf,
        /// The imported directory.
        directory: PathBuf,
        /// The index unit the edge points to.
        index: PathBuf,
    },
}

impl GraphWarning {
    /// Whether the dependency was dropped entirely (as opposed to kept as an
    /// approximated edge).
    pub fn is_dropped(&self) -> bool {
        !matches!(self, GraphWarning::BarrelDependency { .. })
    }

    /// The unit whose dependency list produced this warning.
    pub fn unit(&self) -> &PathBuf {
        match self {
            GraphWarning::UnresolvedDependency { unit, .. }
            | GraphWarning::OutOfScopeDependency { unit, .. }
            | GraphWarning::BarrelDependency { unit, .. } => unit,
        }
    }
}
