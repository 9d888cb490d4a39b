//! Enumeration of in-scope compilation units.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::SourceError;

/// Whether a file is a compilation unit: `.ts` or `.tsx`, but not a
/// storybook story.
pub fn is_source_unit(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    (name.ends_with(".ts") || name.ends_with(".tsx")) && !name.ends_with(".stories.tsx")
}

/// Lists every compilation unit under `root`, as canonical paths in
/// ascending order.
///
/// `node_modules` and dot-directories are not descended into.
pub fn discover_units(root: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let root = fs::canonicalize(root).map_err(|source| SourceError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut units = Vec::new();
    for entry in WalkDir::new(&root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_source_unit(entry.path()) {
            units.push(entry.into_path());
        }
    }
    units.sort();
    tracing::debug!(root = %root.display(), count = units.len(), "discovered units");
    Ok(units)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "node_modules" || name.starts_with('.')
}
