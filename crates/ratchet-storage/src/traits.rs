//! The [`ConfigStore`] trait defining the persisted-configuration contract.
//!
//! The engine needs exactly two operations from whatever owns the
//! authoritative configuration. Both are idempotent. All backends
//! (`InMemoryStore`, `TsConfigStore`) implement this trait so the migration
//! driver can run against either without changes.

use std::path::Path;

use ratchet_core::AcceptedSet;

use crate::error::StorageError;

/// The storage contract for the accepted set.
///
/// The trait is synchronous; the driver is single-threaded and commits one
/// unit at a time.
pub trait ConfigStore {
    /// Evaluates the configuration and returns every accepted unit.
    fn read_accepted_set(&self) -> Result<AcceptedSet, StorageError>;

    /// Durably adds `unit` to the accepted set.
    ///
    /// Succeeds without changes if the unit is already accepted. A returned
    /// `Ok` means the write has landed.
    fn add_unit_to_accepted_set(&mut self, unit: &Path) -> Result<(), StorageError>;
}

impl<S: ConfigStore + ?Sized> ConfigStore for &mut S {
    fn read_accepted_set(&self) -> Result<AcceptedSet, StorageError> {
        (**self).read_accepted_set()
    }

    fn add_unit_to_accepted_set(&mut self, unit: &Path) -> Result<(), StorageError> {
        (**self).add_unit_to_accepted_set(unit)
    }
}
