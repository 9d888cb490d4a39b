//! In-memory implementation of [`ConfigStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and for embedding
//! the engine where the accepted set lives somewhere else. It keeps the
//! committed units in order so callers can inspect the commit sequence.

use std::path::{Path, PathBuf};

use ratchet_core::AcceptedSet;

use crate::error::StorageError;
use crate::traits::ConfigStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    accepted: AcceptedSet,
    /// Units added through [`ConfigStore::add_unit_to_accepted_set`], in
    /// commit order, without duplicates.
    commits: Vec<PathBuf>,
    reject_writes: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose initial accepted set is `units`.
    pub fn with_accepted<I, P>(units: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        InMemoryStore {
            accepted: units.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Makes every subsequent write fail, to simulate an unwritable
    /// configuration.
    pub fn reject_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    /// Units committed so far, in commit order.
    pub fn commits(&self) -> &[PathBuf] {
        &self.commits
    }

    pub fn accepted(&self) -> &AcceptedSet {
        &self.accepted
    }
}

impl ConfigStore for InMemoryStore {
    fn read_accepted_set(&self) -> Result<AcceptedSet, StorageError> {
        Ok(self.accepted.clone())
    }

    fn add_unit_to_accepted_set(&mut self, unit: &Path) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::WriteRejected {
                reason: format!("store is read-only, cannot add {}", unit.display()),
            });
        }
        if self.accepted.insert(unit) {
            self.commits.push(unit.to_path_buf());
        }
        Ok(())
    }
}
