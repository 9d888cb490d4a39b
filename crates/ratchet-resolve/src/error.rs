//! Error types for source discovery and resolver setup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while enumerating source units or preparing a resolver.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A path could not be read or canonicalized.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed.
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// An import pattern failed to compile.
    #[error("invalid import pattern: {0}")]
    Pattern(#[from] regex::Error),
}
