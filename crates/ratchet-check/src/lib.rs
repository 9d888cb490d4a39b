//! Validation and migration for ratchet.
//!
//! - [`oracle`]: the checker abstraction and its `tsc --watch` backend
//! - [`driver`]: the pass loop that grows the accepted set to a fixpoint
//! - [`report`]: the per-cluster diagnostic dump

pub mod driver;
pub mod error;
pub mod oracle;
pub mod report;

pub use driver::{Attempt, AttemptOutcome, DriverState, MigrationDriver, MigrationReport};
pub use error::{DriverError, OracleError, OracleFailure, ReportError};
pub use oracle::{Oracle, OracleConfig, OracleSession, TscOracle, TscSession, Verdict};
pub use report::{DiagnosticNode, DumpFormat, Progress};
