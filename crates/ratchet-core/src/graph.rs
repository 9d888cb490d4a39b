//! DependencyGraph: the unit-level import graph.
//!
//! [`DependencyGraph`] is built once per run from the full set of in-scope
//! units and a [`UnitResolver`]. It is the immutable memo of every import
//! lookup for the run; nothing re-resolves a unit after construction.
//!
//! # Edge policy
//!
//! - A dependency on an in-scope unit becomes an edge (deduplicated, in the
//!   resolver's order).
//! - A dependency on a directory is folded into a dependency on its index
//!   unit and recorded as a [`GraphWarning::BarrelDependency`].
//! - Unresolvable and out-of-scope dependencies are dropped and recorded as
//!   warnings. Edges into unknown nodes are never created.
//! - Non-source dependencies (stylesheets, data files, typed JS) are dropped
//!   silently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::diagnostics::GraphWarning;
use crate::error::{CoreError, ResolveError};
use crate::id::UnitId;

/// One entry of a unit's raw dependency list, as classified by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// A concrete file.
    Unit(PathBuf),
    /// A directory import, represented by the aggregating index file.
    Barrel { directory: PathBuf, index: PathBuf },
    /// Not a source artifact (or typed elsewhere); never an edge.
    NonSource(String),
    /// Could not be mapped to any file.
    Unresolved(String),
}

/// Maps a unit to the units it directly depends on.
///
/// Implementations must be a pure function of on-disk content for the
/// duration of a run.
pub trait UnitResolver {
    fn resolve_dependencies(&self, unit: &Path) -> Result<Vec<Dependency>, ResolveError>;
}

/// A [`UnitResolver`] backed by a fixed table. Units missing from the table
/// have no dependencies.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    table: HashMap<PathBuf, Vec<Dependency>>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit whose dependencies are all concrete files.
    pub fn with_unit<I, P>(mut self, unit: impl Into<PathBuf>, deps: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let deps = deps
            .into_iter()
            .map(|p| Dependency::Unit(p.into()))
            .collect();
        self.table.insert(unit.into(), deps);
        self
    }

    /// Adds a unit with an explicit, already classified dependency list.
    pub fn with_dependencies(mut self, unit: impl Into<PathBuf>, deps: Vec<Dependency>) -> Self {
        self.table.insert(unit.into(), deps);
        self
    }

    /// All units named as keys, in no particular order.
    pub fn units(&self) -> impl Iterator<Item = &PathBuf> {
        self.table.keys()
    }
}

impl UnitResolver for MapResolver {
    fn resolve_dependencies(&self, unit: &Path) -> Result<Vec<Dependency>, ResolveError> {
        Ok(self.table.get(unit).cloned().unwrap_or_default())
    }
}

/// Directed graph over compilation units. An edge `a -> b` means `a`
/// depends on (imports) `b`.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<PathBuf, (), u32>,
    index: HashMap<PathBuf, UnitId>,
    warnings: Vec<GraphWarning>,
}

impl DependencyGraph {
    /// Builds the graph over `units` using `resolver`.
    ///
    /// Units are deduplicated and assigned IDs in ascending path order.
    /// Fails only if the resolver cannot read a unit at all.
    pub fn build<R>(
        units: impl IntoIterator<Item = PathBuf>,
        resolver: &R,
    ) -> Result<Self, CoreError>
    where
        R: UnitResolver + ?Sized,
    {
        let mut paths: Vec<PathBuf> = units.into_iter().collect();
        paths.sort();
        paths.dedup();

        let mut graph = DiGraph::<PathBuf, (), u32>::with_capacity(paths.len(), paths.len());
        let mut index = HashMap::with_capacity(paths.len());
        for path in &paths {
            let idx = graph.add_node(path.clone());
            index.insert(path.clone(), UnitId::from(idx));
        }

        let mut warnings = Vec::new();
        for (i, path) in paths.iter().enumerate() {
            let from = NodeIndex::<u32>::new(i);
            let deps = resolver
                .resolve_dependencies(path)
                .map_err(|source| CoreError::Resolve {
                    unit: path.clone(),
                    source,
                })?;

            let mut targets: IndexSet<UnitId> = IndexSet::new();
            for dep in deps {
                match dep {
                    Dependency::Unit(target) => match index.get(&target) {
                        Some(&id) => {
                            targets.insert(id);
                        }
                        None => record(
                            &mut warnings,
                            GraphWarning::OutOfScopeDependency {
                                unit: path.clone(),
                                target,
                            },
                        ),
                    },
                    Dependency::Barrel {
                        directory,
                        index: index_path,
                    } => match index.get(&index_path) {
                        Some(&id) => {
                            targets.insert(id);
                            record(
                                &mut warnings,
                                GraphWarning::BarrelDependency {
                                    unit: path.clone(),
                                    directory,
                                    index: index_path,
                                },
                            );
                        }
                        None => record(
                            &mut warnings,
                            GraphWarning::OutOfScopeDependency {
                                unit: path.clone(),
                                target: index_path,
                            },
                        ),
                    },
                    Dependency::NonSource(specifier) => {
                        tracing::trace!(unit = %path.display(), %specifier, "skipping non-source import");
                    }
                    Dependency::Unresolved(specifier) => record(
                        &mut warnings,
                        GraphWarning::UnresolvedDependency {
                            unit: path.clone(),
                            specifier,
                        },
                    ),
                }
            }

            for target in targets {
                graph.add_edge(from, target.into(), ());
            }
        }

        Ok(DependencyGraph {
            graph,
            index,
            warnings,
        })
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Number of units.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of distinct dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All unit IDs in ascending (path) order.
    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.graph.node_indices().map(UnitId::from)
    }

    /// The path of a unit.
    pub fn path(&self, id: UnitId) -> Option<&Path> {
        self.graph.node_weight(id.into()).map(PathBuf::as_path)
    }

    /// The ID of a unit path, if it is in scope.
    pub fn unit_id(&self, path: &Path) -> Option<UnitId> {
        self.index.get(path).copied()
    }

    /// Direct dependencies of a unit, sorted by ID.
    pub fn dependencies(&self, id: UnitId) -> Vec<UnitId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Units that directly depend on `id`, sorted by ID.
    pub fn dependents(&self, id: UnitId) -> Vec<UnitId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Warnings recorded during construction, in discovery order.
    pub fn warnings(&self) -> &[GraphWarning] {
        &self.warnings
    }

    /// Returns a read-only reference to the underlying petgraph graph.
    pub fn inner(&self) -> &DiGraph<PathBuf, (), u32> {
        &self.graph
    }

    fn neighbors(&self, id: UnitId, direction: Direction) -> Vec<UnitId> {
        if id.index() >= self.graph.node_count() {
            return Vec::new();
        }
        let mut ids: Vec<UnitId> = self
            .graph
            .neighbors_directed(id.into(), direction)
            .map(UnitId::from)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

fn record(warnings: &mut Vec<GraphWarning>, warning: GraphWarning) {
    tracing::warn!("{}", warning);
    warnings.push(warning);
}
