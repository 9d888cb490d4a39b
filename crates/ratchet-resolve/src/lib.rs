//! TypeScript unit resolution for ratchet.
//!
//! Provides the pieces the language-agnostic core leaves to a collaborator:
//! which files are compilation units ([`source`]), which specifiers a unit
//! imports ([`scan`]), and how those specifiers map to files
//! ([`resolve`]).

pub mod error;
pub mod resolve;
pub mod scan;
pub mod source;

pub use error::SourceError;
pub use resolve::{normalize, TsResolver};
pub use scan::ImportScanner;
pub use source::{discover_units, is_source_unit};
