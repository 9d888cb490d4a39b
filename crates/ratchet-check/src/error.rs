//! Error types for the oracle adapter, the migration driver and the
//! diagnostic report.

use std::path::PathBuf;
use std::time::Duration;

use ratchet_core::CoreError;
use ratchet_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Why a submission produced no verdict.
///
/// Recoverable: the driver treats the cluster as rejected for this pass and
/// restarts the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OracleFailure {
    #[error("no completion signal within {}s", .after.as_secs_f64())]
    TimedOut { after: Duration },

    #[error("checker exited (status {})", exit_status(.code))]
    Exited { code: Option<i32> },

    #[error("session unusable: {reason}")]
    Unavailable { reason: String },
}

fn exit_status(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

/// Fatal oracle errors: the session could not be started or torn down.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to spawn {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checker never became ready: {0}")]
    Startup(OracleFailure),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] StorageError),

    #[error("invalid completion pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors that abort a migration run.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("configuration I/O failed: {0}")]
    Store(#[from] StorageError),

    #[error("oracle could not be started: {0}")]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Graph(#[from] CoreError),
}

/// Errors produced while building or writing the diagnostic dump.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Graph(#[from] CoreError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}
