//! [`ConfigStore`] backed by a `tsconfig.json` file on disk.
//!
//! The accepted set is the units matched by `include` and not matched by
//! `exclude`, plus every source unit listed under `files`. Patterns are
//! relative to the configuration's directory; a pattern whose last segment
//! has no wildcard and no extension also names everything beneath it, the
//! way the compiler reads directory entries.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ratchet_core::AcceptedSet;
use ratchet_resolve::{discover_units, is_source_unit, normalize};

use crate::document::{strip_dot_slash, unit_entry, InclusionMode, TsConfigDocument};
use crate::error::StorageError;
use crate::traits::ConfigStore;

#[derive(Debug, Clone)]
pub struct TsConfigStore {
    path: PathBuf,
    root: PathBuf,
    mode: InclusionMode,
}

impl TsConfigStore {
    /// Opens the configuration at `path`, checking that it parses.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let path = fs::canonicalize(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        TsConfigDocument::load(&path)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| StorageError::Malformed {
                reason: format!("{} has no parent directory", path.display()),
            })?;
        Ok(TsConfigStore {
            path,
            root,
            mode: InclusionMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: InclusionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Canonical path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the configuration's entries are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> InclusionMode {
        self.mode
    }

    pub fn document(&self) -> Result<TsConfigDocument, StorageError> {
        TsConfigDocument::load(&self.path)
    }

    fn accepted_in(&self, doc: &TsConfigDocument) -> Result<AcceptedSet, StorageError> {
        let patterns = Patterns::compile(doc)?;
        let mut accepted = AcceptedSet::new();

        for unit in discover_units(&self.root)? {
            if let Some(entry) = unit_entry(&self.root, &unit) {
                if patterns.matches(strip_dot_slash(&entry)) {
                    accepted.insert(unit);
                }
            }
        }
        for entry in doc.files()? {
            let path = normalize(&self.root.join(strip_dot_slash(&entry)));
            if is_source_unit(&path) {
                accepted.insert(fs::canonicalize(&path).unwrap_or(path));
            }
        }
        Ok(accepted)
    }
}

impl ConfigStore for TsConfigStore {
    fn read_accepted_set(&self) -> Result<AcceptedSet, StorageError> {
        self.accepted_in(&self.document()?)
    }

    fn add_unit_to_accepted_set(&mut self, unit: &Path) -> Result<(), StorageError> {
        let mut doc = self.document()?;
        if !include_unit(&mut doc, &self.root, unit, self.mode)? {
            tracing::debug!(unit = %unit.display(), "already accepted");
            return Ok(());
        }
        doc.write_atomic(&self.path)?;
        tracing::debug!(unit = %unit.display(), config = %self.path.display(), "persisted");
        Ok(())
    }
}

/// Rewrites `doc` so that `unit` is included.
///
/// `RemoveFromExclude` drops the unit's own `exclude` entry; any unit still
/// left out afterwards, and every unit under `AddToFiles`, is listed under
/// `files`. Returns `false` without touching `doc` if the unit was already
/// included.
pub fn include_unit(
    doc: &mut TsConfigDocument,
    root: &Path,
    unit: &Path,
    mode: InclusionMode,
) -> Result<bool, StorageError> {
    let entry = unit_entry(root, unit).ok_or_else(|| StorageError::OutsideRoot {
        unit: unit.to_path_buf(),
    })?;
    if is_included(doc, root, &entry)? {
        return Ok(false);
    }
    if mode == InclusionMode::RemoveFromExclude
        && doc.remove_exclude(&entry)?
        && is_included(doc, root, &entry)?
    {
        return Ok(true);
    }
    doc.add_file(&entry)?;
    Ok(true)
}

/// Whether the unit at `entry` is included by `doc`, without walking the
/// project.
fn is_included(doc: &TsConfigDocument, root: &Path, entry: &str) -> Result<bool, StorageError> {
    let rel = strip_dot_slash(entry);
    if Patterns::compile(doc)?.matches(rel) {
        return Ok(true);
    }
    let target = normalize(&root.join(rel));
    Ok(doc
        .files()?
        .iter()
        .any(|file| normalize(&root.join(strip_dot_slash(file))) == target))
}

struct Patterns {
    include: GlobSet,
    exclude: GlobSet,
}

impl Patterns {
    fn compile(doc: &TsConfigDocument) -> Result<Self, StorageError> {
        Ok(Patterns {
            include: glob_set(&doc.include()?)?,
            exclude: glob_set(&doc.exclude()?)?,
        })
    }

    fn matches(&self, rel: &str) -> bool {
        self.include.is_match(rel) && !self.exclude.is_match(rel)
    }
}

fn glob_set(patterns: &[String]) -> Result<GlobSet, StorageError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = strip_dot_slash(pattern).trim_end_matches('/');
        builder.add(glob(pattern)?);
        if names_directory(pattern) {
            builder.add(glob(&format!("{pattern}/**/*"))?);
        }
    }
    Ok(builder.build()?)
}

fn glob(pattern: &str) -> Result<globset::Glob, StorageError> {
    Ok(GlobBuilder::new(pattern).literal_separator(true).build()?)
}

fn names_directory(pattern: &str) -> bool {
    let last = pattern.rsplit('/').next().unwrap_or(pattern);
    !last.is_empty() && !last.contains(['*', '?', '.'])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Project {
        _dir: tempfile::TempDir,
        root: PathBuf,
        config: PathBuf,
    }

    fn project(config: &str) -> Project {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        for rel in [
            "src/core/a.ts",
            "src/core/b.tsx",
            "src/core/b.stories.tsx",
            "src/ui/c.ts",
            "src/ui/d.ts",
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "export {};\n").unwrap();
        }
        let config_path = root.join("tsconfig.strict.json");
        fs::write(&config_path, config).unwrap();
        Project {
            _dir: dir,
            root,
            config: config_path,
        }
    }

    fn rels(set: &AcceptedSet, root: &Path) -> Vec<String> {
        set.iter()
            .map(|p| unit_entry(root, p).unwrap())
            .collect()
    }

    #[test]
    fn include_minus_exclude_plus_files() {
        let p = project(
            r#"{"include": ["./src/core/**/*"], "exclude": ["src/core/b.tsx"], "files": ["./src/ui/c.ts", "./README.md"]}"#,
        );
        let store = TsConfigStore::open(&p.config).unwrap();
        let accepted = store.read_accepted_set().unwrap();
        assert_eq!(rels(&accepted, &p.root), vec!["./src/core/a.ts", "./src/ui/c.ts"]);
    }

    #[test]
    fn bare_directory_patterns_cover_their_contents() {
        let p = project(r#"{"include": ["src/ui"]}"#);
        let store = TsConfigStore::open(&p.config).unwrap();
        let accepted = store.read_accepted_set().unwrap();
        assert_eq!(rels(&accepted, &p.root), vec!["./src/ui/c.ts", "./src/ui/d.ts"]);
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let p = project(r#"{"include": ["src/*"]}"#);
        let store = TsConfigStore::open(&p.config).unwrap();
        assert!(store.read_accepted_set().unwrap().is_empty());
    }

    #[test]
    fn add_lists_new_unit_under_files() {
        let p = project(r#"{"compilerOptions": {"strict": true}, "files": ["./src/ui/d.ts"]}"#);
        let mut store = TsConfigStore::open(&p.config).unwrap();
        store
            .add_unit_to_accepted_set(&p.root.join("src/ui/c.ts"))
            .unwrap();

        let doc = store.document().unwrap();
        assert_eq!(doc.files().unwrap(), vec!["./src/ui/c.ts", "./src/ui/d.ts"]);
        assert!(store
            .read_accepted_set()
            .unwrap()
            .contains(&p.root.join("src/ui/c.ts")));
    }

    #[test]
    fn remove_from_exclude_mode_drops_the_exclude_entry() {
        let p = project(r#"{"include": ["src/core/**/*"], "exclude": ["./src/core/a.ts"]}"#);
        let mut store = TsConfigStore::open(&p.config)
            .unwrap()
            .with_mode(InclusionMode::RemoveFromExclude);
        store
            .add_unit_to_accepted_set(&p.root.join("src/core/a.ts"))
            .unwrap();

        let doc = store.document().unwrap();
        assert!(doc.exclude().unwrap().is_empty());
        assert!(doc.files().unwrap().is_empty());
    }

    #[test]
    fn add_to_files_mode_leaves_exclude_alone() {
        let p = project(r#"{"include": ["src/core/**/*"], "exclude": ["./src/core/a.ts"]}"#);
        let mut store = TsConfigStore::open(&p.config).unwrap();
        store
            .add_unit_to_accepted_set(&p.root.join("src/core/a.ts"))
            .unwrap();

        let doc = store.document().unwrap();
        assert_eq!(doc.exclude().unwrap(), vec!["./src/core/a.ts"]);
        assert_eq!(doc.files().unwrap(), vec!["./src/core/a.ts"]);
        assert!(store
            .read_accepted_set()
            .unwrap()
            .contains(&p.root.join("src/core/a.ts")));
    }

    #[test]
    fn add_is_idempotent_and_leaves_file_untouched() {
        let p = project(r#"{"include": ["src/core/**/*"], "files": ["./src/ui/c.ts"]}"#);
        let before = fs::read_to_string(&p.config).unwrap();
        let mut store = TsConfigStore::open(&p.config).unwrap();
        store
            .add_unit_to_accepted_set(&p.root.join("src/core/a.ts"))
            .unwrap();
        store
            .add_unit_to_accepted_set(&p.root.join("src/ui/c.ts"))
            .unwrap();
        assert_eq!(fs::read_to_string(&p.config).unwrap(), before);
    }

    #[test]
    fn glob_excluded_unit_falls_back_to_files() {
        let p = project(r#"{"include": ["src/**/*"], "exclude": ["src/ui/**"]}"#);
        let mut store = TsConfigStore::open(&p.config)
            .unwrap()
            .with_mode(InclusionMode::RemoveFromExclude);
        let unit = p.root.join("src/ui/c.ts");
        store.add_unit_to_accepted_set(&unit).unwrap();

        let doc = store.document().unwrap();
        assert_eq!(doc.exclude().unwrap(), vec!["src/ui/**"]);
        assert_eq!(doc.files().unwrap(), vec!["./src/ui/c.ts"]);
        let accepted = store.read_accepted_set().unwrap();
        assert!(accepted.contains(&unit));
        assert!(!accepted.contains(&p.root.join("src/ui/d.ts")));
    }

    #[test]
    fn exact_entry_shadowed_by_a_glob_still_gets_listed() {
        let p = project(r#"{"include": ["src/**/*"], "exclude": ["./src/ui/c.ts", "src/ui/*"]}"#);
        let mut store = TsConfigStore::open(&p.config)
            .unwrap()
            .with_mode(InclusionMode::RemoveFromExclude);
        let unit = p.root.join("src/ui/c.ts");
        store.add_unit_to_accepted_set(&unit).unwrap();

        let doc = store.document().unwrap();
        assert_eq!(doc.exclude().unwrap(), vec!["src/ui/*"]);
        assert_eq!(doc.files().unwrap(), vec!["./src/ui/c.ts"]);
        assert!(store.read_accepted_set().unwrap().contains(&unit));
    }

    #[test]
    fn include_unit_reports_whether_it_changed_the_document() {
        let p = project(r#"{"include": ["src/core/**/*"]}"#);
        let mut doc = TsConfigDocument::load(&p.config).unwrap();
        let before = doc.clone();

        let core = p.root.join("src/core/a.ts");
        assert!(!include_unit(&mut doc, &p.root, &core, InclusionMode::AddToFiles).unwrap());
        assert_eq!(doc, before);

        let ui = p.root.join("src/ui/c.ts");
        assert!(include_unit(&mut doc, &p.root, &ui, InclusionMode::RemoveFromExclude).unwrap());
        assert_eq!(doc.files().unwrap(), vec!["./src/ui/c.ts"]);
    }

    #[test]
    fn units_outside_the_root_are_rejected() {
        let p = project("{}");
        let mut store = TsConfigStore::open(&p.config).unwrap();
        let err = store
            .add_unit_to_accepted_set(Path::new("/somewhere/else.ts"))
            .unwrap_err();
        assert!(matches!(err, StorageError::OutsideRoot { .. }));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let p = project(r#"{"include": ["src/[a"]}"#);
        let store = TsConfigStore::open(&p.config).unwrap();
        assert!(matches!(
            store.read_accepted_set(),
            Err(StorageError::Glob(_))
        ));
    }

    #[test]
    fn missing_config_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = TsConfigStore::open(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
