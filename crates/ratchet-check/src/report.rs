//! Diagnostic dump of the condensed graph: one node per cluster with its
//! migration status, neighbours and depths, for external visualization.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ratchet_core::{compute_depths, eligible, AcceptedSet, ClusterId, Condensation, DependencyGraph};
use ratchet_storage::unit_entry;
use serde::Serialize;

use crate::error::ReportError;
use crate::oracle::{Oracle, OracleSession, Verdict};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticNode {
    pub id: ClusterId,
    /// Member paths relative to the configuration directory, sorted.
    pub files: Vec<String>,
    /// Every member is accepted.
    pub checked: bool,
    pub eligible: bool,
    /// Only present when errors were counted for an eligible cluster.
    pub error_count: Option<u32>,
    pub dependents: Vec<ClusterId>,
    pub dependencies: Vec<ClusterId>,
    pub dependent_depth: u32,
    pub dependency_depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    /// `window.nodes = <json>`, loadable from a `<script>` tag.
    #[default]
    DataJs,
    /// Pretty-printed JSON array.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub accepted_units: usize,
    pub total_units: usize,
    /// Units in clusters that are eligible right now.
    pub eligible_units: usize,
}

pub fn progress(
    graph: &DependencyGraph,
    condensation: &Condensation,
    accepted: &AcceptedSet,
) -> Progress {
    let eligible_units = eligible(graph, condensation, accepted)
        .into_iter()
        .filter_map(|id| condensation.cluster(id))
        .map(|cluster| cluster.len())
        .sum();
    Progress {
        accepted_units: accepted.count_in(graph),
        total_units: graph.len(),
        eligible_units,
    }
}

/// Builds one node per cluster, in cluster order.
pub fn build_nodes(
    graph: &DependencyGraph,
    condensation: &Condensation,
    accepted: &AcceptedSet,
    root: &Path,
    error_counts: &BTreeMap<ClusterId, u32>,
) -> Result<Vec<DiagnosticNode>, ReportError> {
    let depths = compute_depths(condensation)?;
    let frontier = eligible(graph, condensation, accepted);

    condensation
        .clusters()
        .iter()
        .map(|cluster| -> Result<DiagnosticNode, ReportError> {
            let id = cluster.id;
            let mut files: Vec<String> = condensation
                .member_paths(graph, id)?
                .into_iter()
                .map(|path| relative(root, path))
                .collect();
            files.sort();
            let depth = depths.get(id.index()).copied().unwrap_or_default();

            Ok(DiagnosticNode {
                id,
                files,
                checked: accepted.is_cluster_accepted(graph, condensation, id),
                eligible: frontier.binary_search(&id).is_ok(),
                error_count: error_counts.get(&id).copied(),
                dependents: condensation.dependents(id).to_vec(),
                dependencies: condensation.dependencies(id).to_vec(),
                dependent_depth: depth.dependent_depth,
                dependency_depth: depth.dependency_depth,
            })
        })
        .collect()
}

/// Submits each cluster to the oracle and records its error count. Nothing
/// is committed. Clusters whose submission fails get no count, and the
/// session is restarted before the next one.
pub fn count_errors<O: Oracle>(
    oracle: &mut O,
    graph: &DependencyGraph,
    condensation: &Condensation,
    clusters: &[ClusterId],
) -> Result<BTreeMap<ClusterId, u32>, ReportError> {
    let mut counts = BTreeMap::new();
    let mut session: Option<O::Session> = None;

    for &id in clusters {
        let units = condensation.member_paths(graph, id)?;
        tracing::info!(cluster = %id, units = units.len(), "counting errors");

        let active = match &mut session {
            Some(active) => active,
            None => session.insert(oracle.acquire()?),
        };
        match active.submit(&units) {
            Verdict::Errors(count) => {
                counts.insert(id, count);
            }
            Verdict::Failed(failure) => {
                tracing::warn!(cluster = %id, %failure, "no error count");
                if let Some(broken) = session.take() {
                    if let Err(err) = broken.release() {
                        tracing::warn!(error = %err, "failed to release oracle session");
                    }
                }
            }
        }
    }

    if let Some(active) = session {
        if let Err(err) = active.release() {
            tracing::warn!(error = %err, "failed to release oracle session");
        }
    }
    Ok(counts)
}

pub fn render(nodes: &[DiagnosticNode], format: DumpFormat) -> Result<String, ReportError> {
    Ok(match format {
        DumpFormat::DataJs => format!("window.nodes = {}", serde_json::to_string(nodes)?),
        DumpFormat::Json => serde_json::to_string_pretty(nodes)?,
    })
}

pub fn write_dump(
    path: &Path,
    nodes: &[DiagnosticNode],
    format: DumpFormat,
) -> Result<(), ReportError> {
    let text = render(nodes, format)?;
    fs::write(path, text).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn relative(root: &Path, path: &Path) -> String {
    match unit_entry(root, path) {
        Some(entry) => entry.trim_start_matches("./").to_string(),
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratchet_core::MapResolver;

    /// `top -> mid -> leaf`, plus a cycle `x <-> y` that depends on `leaf`.
    fn fixture() -> (DependencyGraph, Condensation) {
        let resolver = MapResolver::new()
            .with_unit("/p/src/top.ts", ["/p/src/mid.ts"])
            .with_unit("/p/src/mid.ts", ["/p/src/leaf.ts"])
            .with_unit("/p/src/leaf.ts", Vec::<&str>::new())
            .with_unit("/p/src/x.ts", ["/p/src/y.ts", "/p/src/leaf.ts"])
            .with_unit("/p/src/y.ts", ["/p/src/x.ts"]);
        let graph = DependencyGraph::build(resolver.units().cloned(), &resolver).unwrap();
        let condensation = Condensation::build(&graph).unwrap();
        (graph, condensation)
    }

    fn node<'a>(nodes: &'a [DiagnosticNode], file: &str) -> &'a DiagnosticNode {
        nodes
            .iter()
            .find(|n| n.files.iter().any(|f| f == file))
            .unwrap()
    }

    #[test]
    fn nodes_carry_status_neighbours_and_depths() {
        let (graph, condensation) = fixture();
        let accepted: AcceptedSet = ["/p/src/leaf.ts"].into_iter().collect();
        let counts = BTreeMap::new();
        let nodes = build_nodes(&graph, &condensation, &accepted, Path::new("/p"), &counts).unwrap();

        assert_eq!(nodes.len(), 4);
        let leaf = node(&nodes, "src/leaf.ts");
        let mid = node(&nodes, "src/mid.ts");
        let top = node(&nodes, "src/top.ts");
        let cycle = node(&nodes, "src/x.ts");

        assert!(leaf.checked && !leaf.eligible);
        assert!(mid.eligible && !mid.checked);
        assert!(!top.eligible);
        assert!(cycle.eligible);
        assert_eq!(cycle.files, vec!["src/x.ts", "src/y.ts"]);

        assert_eq!(mid.dependencies, vec![leaf.id]);
        assert_eq!(leaf.dependents, {
            let mut v = vec![mid.id, cycle.id];
            v.sort();
            v
        });
        assert_eq!(leaf.dependency_depth, 0);
        assert_eq!(top.dependency_depth, 2);
        assert_eq!(leaf.dependent_depth, 2);
        assert_eq!(top.dependent_depth, 0);
        assert!(nodes.iter().all(|n| n.error_count.is_none()));
    }

    #[test]
    fn progress_counts_units() {
        let (graph, condensation) = fixture();
        let accepted: AcceptedSet = ["/p/src/leaf.ts"].into_iter().collect();
        let progress = progress(&graph, &condensation, &accepted);
        assert_eq!(progress.accepted_units, 1);
        assert_eq!(progress.total_units, 5);
        assert_eq!(progress.eligible_units, 3);
    }

    #[test]
    fn data_js_wraps_camel_case_json() {
        let (graph, condensation) = fixture();
        let mut counts = BTreeMap::new();
        counts.insert(ClusterId(0), 4);
        let nodes =
            build_nodes(&graph, &condensation, &AcceptedSet::new(), Path::new("/p"), &counts).unwrap();

        let text = render(&nodes, DumpFormat::DataJs).unwrap();
        let json = text.strip_prefix("window.nodes = ").unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        let first = &value[0];
        for key in [
            "id",
            "files",
            "checked",
            "eligible",
            "errorCount",
            "dependents",
            "dependencies",
            "dependentDepth",
            "dependencyDepth",
        ] {
            assert!(first.get(key).is_some(), "missing {key}");
        }
        assert_eq!(first["errorCount"], 4);
        assert!(value[1]["errorCount"].is_null());
    }

    #[test]
    fn write_dump_writes_json() {
        let (graph, condensation) = fixture();
        let nodes = build_nodes(
            &graph,
            &condensation,
            &AcceptedSet::new(),
            Path::new("/p"),
            &BTreeMap::new(),
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");
        write_dump(&path, &nodes, DumpFormat::Json).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 4);
    }
}
