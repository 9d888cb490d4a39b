//! The tsconfig document: a JSON object whose `files`, `include` and
//! `exclude` keys define the accepted set.
//!
//! Unknown keys are carried through untouched and in their original order.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::error::StorageError;

/// How a unit is brought into a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InclusionMode {
    /// Drop the unit's `exclude` entry if there is one, then list it under
    /// `files` if it is still not accepted.
    #[default]
    AddToFiles,
    /// Only drop the unit's `exclude` entry.
    RemoveFromExclude,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsConfigDocument {
    root: Map<String, Value>,
}

impl TsConfigDocument {
    pub fn parse(text: &str) -> Result<Self, StorageError> {
        match serde_json::from_str(text)? {
            Value::Object(root) => Ok(TsConfigDocument { root }),
            other => Err(StorageError::Malformed {
                reason: format!("expected a JSON object at the top level, found {}", kind(&other)),
            }),
        }
    }

    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let text = fs::read_to_string(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Two-space indented JSON, no trailing newline.
    pub fn to_pretty_string(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    pub fn files(&self) -> Result<Vec<String>, StorageError> {
        self.string_list("files")
    }

    pub fn include(&self) -> Result<Vec<String>, StorageError> {
        self.string_list("include")
    }

    pub fn exclude(&self) -> Result<Vec<String>, StorageError> {
        self.string_list("exclude")
    }

    pub fn set_files(&mut self, files: Vec<String>) {
        self.set_string_list("files", files);
    }

    pub fn set_exclude(&mut self, exclude: Vec<String>) {
        self.set_string_list("exclude", exclude);
    }

    /// Removes `entry` from `exclude`. Returns whether it was present.
    pub fn remove_exclude(&mut self, entry: &str) -> Result<bool, StorageError> {
        let mut exclude = self.exclude()?;
        let before = exclude.len();
        exclude.retain(|e| strip_dot_slash(e) != strip_dot_slash(entry));
        if exclude.len() == before {
            return Ok(false);
        }
        self.set_exclude(exclude);
        Ok(true)
    }

    /// Adds `entry` to `files`, which is kept sorted and deduplicated.
    pub fn add_file(&mut self, entry: &str) -> Result<(), StorageError> {
        let mut files: BTreeSet<String> = self.files()?.into_iter().collect();
        files.insert(entry.to_string());
        self.set_files(files.into_iter().collect());
        Ok(())
    }

    /// Writes through a sibling temporary file and renames it over `path`,
    /// so readers never observe a partial document.
    pub fn write_atomic(&self, path: &Path) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let text = self.to_pretty_string()?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(text.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, StorageError> {
        let Some(value) = self.root.get(key) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(StorageError::Malformed {
                reason: format!("`{key}` must be an array, found {}", kind(value)),
            });
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(StorageError::Malformed {
                    reason: format!("`{key}` entries must be strings, found {}", kind(other)),
                }),
            })
            .collect()
    }

    fn set_string_list(&mut self, key: &str, items: Vec<String>) {
        let value = Value::Array(items.into_iter().map(Value::String).collect());
        match self.root.get_mut(key) {
            Some(slot) => *slot = value,
            None => {
                self.root.insert(key.to_string(), value);
            }
        }
    }
}

/// The configuration entry naming `unit`: `./` followed by its path
/// relative to `root`, with `/` separators.
pub fn unit_entry(root: &Path, unit: &Path) -> Option<String> {
    let rel = unit.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!("./{}", parts.join("/")))
}

pub(crate) fn strip_dot_slash(entry: &str) -> &str {
    entry.strip_prefix("./").unwrap_or(entry)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
