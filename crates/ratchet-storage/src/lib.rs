//! Persistence of the accepted set for ratchet.
//!
//! Defines the [`ConfigStore`] trait and two backends: [`InMemoryStore`]
//! for tests and embedding, and [`TsConfigStore`], which evaluates and
//! rewrites a `tsconfig.json`.

pub mod document;
pub mod error;
pub mod memory;
pub mod traits;
pub mod tsconfig;

pub use document::{unit_entry, InclusionMode, TsConfigDocument};
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use traits::ConfigStore;
pub use tsconfig::{include_unit, TsConfigStore};
