//! Storage error types for ratchet-storage.
//!
//! Every [`StorageError`] is a configuration I/O failure from the engine's
//! point of view and aborts the run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by configuration store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing a file failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document parsed but does not have the expected shape.
    #[error("malformed configuration: {reason}")]
    Malformed { reason: String },

    /// An include or exclude pattern is not a valid glob.
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    /// Enumerating source units failed.
    #[error("source discovery failed: {0}")]
    Discovery(#[from] ratchet_resolve::SourceError),

    /// The unit does not live under the configuration's directory.
    #[error("unit {} is outside the project root", .unit.display())]
    OutsideRoot { unit: PathBuf },

    /// The backend refused the write.
    #[error("write rejected: {reason}")]
    WriteRejected { reason: String },
}
