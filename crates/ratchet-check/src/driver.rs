//! The migration driver: repeatedly offers every eligible cluster to the
//! oracle and commits the ones that check clean, until a pass adds nothing.

use std::path::{Path, PathBuf};

use ratchet_core::{eligible, AcceptedSet, ClusterId, Condensation, DependencyGraph};
use ratchet_storage::{unit_entry, ConfigStore};
use serde::Serialize;

use crate::error::DriverError;
use crate::oracle::{Oracle, OracleSession, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    Running,
    Converged,
}

/// What happened to one submitted cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Accepted,
    Rejected { errors: u32 },
    OracleFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub pass: usize,
    pub cluster: ClusterId,
    pub units: Vec<PathBuf>,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Summary of a run to convergence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Passes that submitted at least one cluster.
    pub passes: usize,
    pub attempts: Vec<Attempt>,
    /// Units of the graph accepted once the run converged.
    pub accepted_units: usize,
    pub total_units: usize,
}

impl MigrationReport {
    /// Clusters committed during the run, in commit order.
    pub fn accepted_clusters(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.attempts
            .iter()
            .filter(|a| a.outcome == AttemptOutcome::Accepted)
            .map(|a| a.cluster)
    }
}

/// Drives a migration over one graph.
///
/// The accepted set only grows. Every commit reaches the store before the
/// next cluster is submitted.
pub struct MigrationDriver<'g, S, O> {
    graph: &'g DependencyGraph,
    condensation: &'g Condensation,
    store: S,
    oracle: O,
    state: DriverState,
    /// Progress lines show units relative to this directory.
    root: Option<PathBuf>,
}

impl<'g, S: ConfigStore, O: Oracle> MigrationDriver<'g, S, O> {
    pub fn new(
        graph: &'g DependencyGraph,
        condensation: &'g Condensation,
        store: S,
        oracle: O,
    ) -> Self {
        MigrationDriver {
            graph,
            condensation,
            store,
            oracle,
            state: DriverState::Running,
            root: None,
        }
    }

    /// Shows units relative to `root` in progress output.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, O) {
        (self.store, self.oracle)
    }

    /// Runs passes until one adds nothing.
    pub fn run(&mut self) -> Result<MigrationReport, DriverError> {
        let mut accepted = self.store.read_accepted_set()?;
        let mut report = MigrationReport {
            total_units: self.graph.len(),
            ..MigrationReport::default()
        };
        tracing::info!(
            accepted = accepted.count_in(self.graph),
            total = self.graph.len(),
            "starting migration"
        );

        while self.state == DriverState::Running {
            let frontier = eligible(self.graph, self.condensation, &accepted);
            if frontier.is_empty() {
                self.state = DriverState::Converged;
                break;
            }

            report.passes += 1;
            let added = self.run_pass(report.passes, &frontier, &mut accepted, &mut report)?;
            tracing::info!(pass = report.passes, added, tried = frontier.len(), "pass complete");
            if added == 0 {
                self.state = DriverState::Converged;
            }
        }

        report.accepted_units = accepted.count_in(self.graph);
        tracing::info!(
            accepted = report.accepted_units,
            total = report.total_units,
            passes = report.passes,
            "converged"
        );
        Ok(report)
    }

    fn run_pass(
        &mut self,
        pass: usize,
        frontier: &[ClusterId],
        accepted: &mut AcceptedSet,
        report: &mut MigrationReport,
    ) -> Result<usize, DriverError> {
        let mut session: Option<O::Session> = None;
        let mut added = 0;

        for (i, &cluster) in frontier.iter().enumerate() {
            let units = self.condensation.member_paths(self.graph, cluster)?;
            tracing::info!(
                "trying {} ({}/{})",
                describe(&units, self.root.as_deref()),
                i + 1,
                frontier.len()
            );

            let active = match &mut session {
                Some(active) => active,
                None => session.insert(self.oracle.acquire()?),
            };

            let outcome = match active.submit(&units) {
                Verdict::Errors(0) => {
                    for unit in &units {
                        self.store.add_unit_to_accepted_set(unit)?;
                        accepted.insert(*unit);
                    }
                    added += 1;
                    tracing::info!(cluster = %cluster, "accepted");
                    AttemptOutcome::Accepted
                }
                Verdict::Errors(errors) => {
                    tracing::info!(cluster = %cluster, errors, "rejected");
                    AttemptOutcome::Rejected { errors }
                }
                Verdict::Failed(failure) => {
                    tracing::warn!(cluster = %cluster, %failure, "oracle failed, restarting");
                    if let Some(broken) = session.take() {
                        if let Err(err) = broken.release() {
                            tracing::warn!(error = %err, "failed to release oracle session");
                        }
                    }
                    AttemptOutcome::OracleFailed {
                        reason: failure.to_string(),
                    }
                }
            };

            report.attempts.push(Attempt {
                pass,
                cluster,
                units: units.iter().map(|u| u.to_path_buf()).collect(),
                outcome,
            });
        }

        if let Some(active) = session {
            if let Err(err) = active.release() {
                tracing::warn!(error = %err, "failed to release oracle session");
            }
        }
        Ok(added)
    }
}

fn describe(units: &[&Path], root: Option<&Path>) -> String {
    let show = |unit: &Path| {
        root.and_then(|root| unit_entry(root, unit))
            .map(|entry| entry.trim_start_matches("./").to_string())
            .unwrap_or_else(|| unit.display().to_string())
    };
    match units {
        [single] => format!("'{}'", show(*single)),
        [first, rest @ ..] => format!("'{}' and {} more in its cycle", show(*first), rest.len()),
        [] => "empty cluster".to_string(),
    }
}
