//! The validation oracle: an external checker that, given a tentative
//! configuration, reports how many errors it finds.
//!
//! An [`Oracle`] hands out [`OracleSession`]s. A session owns the checker
//! process and its scoped configuration copy; dropping it tears both down.
//! Submissions take `&mut self`, so at most one is outstanding at a time.

pub mod signal;
pub mod tsc;

use std::path::{Path, PathBuf};
use std::time::Duration;

use ratchet_storage::InclusionMode;

use crate::error::{OracleError, OracleFailure};

pub use signal::CompletionSignal;
pub use tsc::{TscOracle, TscSession};

/// Result of submitting one candidate cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The checker finished and reported this many errors.
    Errors(u32),
    /// No verdict could be obtained.
    Failed(OracleFailure),
}

impl Verdict {
    /// Zero errors: the candidate may be committed.
    pub fn is_clean(&self) -> bool {
        matches!(self, Verdict::Errors(0))
    }
}

/// Starts checker sessions.
pub trait Oracle {
    type Session: OracleSession;

    /// Starts a session against the current baseline configuration and
    /// waits until it is ready for submissions.
    fn acquire(&mut self) -> Result<Self::Session, OracleError>;
}

/// A running checker.
pub trait OracleSession {
    /// Tentatively includes `units` on top of the baseline and blocks until
    /// the checker reports. Submissions are never cumulative.
    fn submit(&mut self, units: &[&Path]) -> Verdict;

    /// Stops the checker and removes its scoped configuration.
    fn release(self) -> Result<(), OracleError>;
}

/// Options for starting the checker.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Checker executable. Relative paths are taken from the
    /// configuration's directory.
    pub program: PathBuf,

    /// Arguments placed before `-p <config>`, e.g. a script path when
    /// `program` is an interpreter.
    pub program_args: Vec<String>,

    /// Arguments placed after `-p <config>`.
    pub watch_args: Vec<String>,

    /// How long the checker may take to report on the baseline.
    pub startup_timeout: Duration,

    /// How long a single submission may take.
    pub submit_timeout: Duration,

    /// How candidates are written into the scoped copy.
    pub mode: InclusionMode,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            program: PathBuf::from("node_modules/typescript/bin/tsc"),
            program_args: Vec::new(),
            watch_args: vec!["--watch".to_string(), "--noEmit".to_string()],
            startup_timeout: Duration::from_secs(600),
            submit_timeout: Duration::from_secs(300),
            mode: InclusionMode::AddToFiles,
        }
    }
}
