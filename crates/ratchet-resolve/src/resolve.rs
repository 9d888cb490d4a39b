//! TypeScript implementation of [`UnitResolver`].
//!
//! Resolution rules, in order:
//! 1. Stylesheet, image, JSON and plain JavaScript specifiers are non-source
//!    (JavaScript is assumed to ship its own declarations).
//! 2. Bare package names (no `/`) are external and never edges.
//! 3. `./` and `../` specifiers resolve against the importing file; every
//!    other specifier resolves against the source root, which covers
//!    `src/…`-style path mappings.
//! 4. Probe `<p>.ts`, `<p>.tsx`, `<p>.d.ts`, then `<p>` itself.
//! 5. A directory resolves to its `index.ts` / `index.tsx` as a barrel
//!    dependency; a directory with only `index.js` is non-source.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use ratchet_core::{Dependency, ResolveError, UnitResolver};

use crate::error::SourceError;
use crate::scan::ImportScanner;

const NON_SOURCE_SUFFIXES: &[&str] = &[".less", ".css", ".svg", ".json", ".js", ".jsx"];
const PROBE_SUFFIXES: &[&str] = &[".ts", ".tsx", ".d.ts"];
const BARREL_INDEXES: &[&str] = &["index.ts", "index.tsx"];

/// Resolves TypeScript imports to unit paths under a source root.
#[derive(Debug, Clone)]
pub struct TsResolver {
    root: PathBuf,
    scanner: ImportScanner,
}

impl TsResolver {
    /// Creates a resolver for the project rooted at `root` (the directory
    /// holding the tsconfig file).
    pub fn new(root: &Path) -> Result<Self, SourceError> {
        let root = fs::canonicalize(root).map_err(|source| SourceError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(TsResolver {
            root,
            scanner: ImportScanner::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classifies one specifier imported from a file in `from_dir`.
    pub fn classify(&self, from_dir: &Path, specifier: &str) -> Dependency {
        if NON_SOURCE_SUFFIXES.iter().any(|s| specifier.ends_with(s)) {
            return Dependency::NonSource(specifier.to_string());
        }

        let relative = specifier == "."
            || specifier == ".."
            || specifier.starts_with("./")
            || specifier.starts_with("../");
        if !relative && !specifier.contains('/') {
            return Dependency::NonSource(specifier.to_string());
        }

        let base = if relative {
            normalize(&from_dir.join(specifier))
        } else {
            normalize(&self.root.join(specifier))
        };

        for suffix in PROBE_SUFFIXES {
            let candidate = with_suffix(&base, suffix);
            if candidate.is_file() {
                return Dependency::Unit(canonical(candidate));
            }
        }

        if base.is_dir() {
            for index in BARREL_INDEXES {
                let candidate = base.join(index);
                if candidate.is_file() {
                    return Dependency::Barrel {
                        directory: canonical(base),
                        index: canonical(candidate),
                    };
                }
            }
            if base.join("index.js").is_file() {
                return Dependency::NonSource(specifier.to_string());
            }
            return Dependency::Unresolved(specifier.to_string());
        }

        if base.is_file() {
            return Dependency::Unit(canonical(base));
        }

        Dependency::Unresolved(specifier.to_string())
    }
}

impl UnitResolver for TsResolver {
    fn resolve_dependencies(&self, unit: &Path) -> Result<Vec<Dependency>, ResolveError> {
        let bytes = fs::read(unit)?;
        let source = String::from_utf8(bytes).map_err(|_| ResolveError::InvalidUtf8)?;
        let from_dir = unit.parent().unwrap_or(&self.root);

        let specifiers = self.scanner.specifiers(&source);
        tracing::trace!(unit = %unit.display(), count = specifiers.len(), "scanned imports");

        Ok(specifiers
            .iter()
            .map(|spec| self.classify(from_dir, spec))
            .collect())
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn canonical(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}

/// Lexically folds `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
