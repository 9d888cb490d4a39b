//! Import specifier extraction from TypeScript source text.
//!
//! A lexical scan, not a parse. It recognizes:
//! - `import x from '…'`, `import { a } from '…'`, `import type … from '…'`
//! - side-effect `import '…'`
//! - `export … from '…'`
//! - `require('…')` and dynamic `import('…')`
//!
//! Block comments and whole-line `//` comments are blanked out before
//! matching, so commented-out imports are not reported.

use regex::Regex;

/// Compiled patterns for finding import specifiers.
#[derive(Debug, Clone)]
pub struct ImportScanner {
    block_comment: Regex,
    line_comment: Regex,
    declaration: Regex,
    call: Regex,
}

impl ImportScanner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(ImportScanner {
            block_comment: Regex::new(r"(?s)/\*.*?\*/")?,
            line_comment: Regex::new(r"(?m)^[ \t]*//.*$")?,
            declaration: Regex::new(
                r#"(?:^|[^\w$.])(?:import|export)\s+(?:type\s+)?(?:[\w$*{}\s,]+?\s+from\s*)?["']([^"'\r\n]+)["']"#,
            )?,
            call: Regex::new(r#"(?:^|[^\w$.])(?:require|import)\s*\(\s*["']([^"'\r\n]+)["']\s*\)"#)?,
        })
    }

    /// Returns every specifier in order of appearance. Duplicates are kept;
    /// the graph builder deduplicates edges.
    pub fn specifiers(&self, source: &str) -> Vec<String> {
        let without_blocks = self.block_comment.replace_all(source, " ");
        let text = self.line_comment.replace_all(&without_blocks, "");

        let mut found: Vec<(usize, String)> = Vec::new();
        for pattern in [&self.declaration, &self.call] {
            for caps in pattern.captures_iter(&text) {
                if let Some(m) = caps.get(1) {
                    found.push((m.start(), m.as_str().to_string()));
                }
            }
        }
        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, spec)| spec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<String> {
        ImportScanner::new().unwrap().specifiers(source)
    }

    #[test]
    fn import_forms() {
        let source = r#"
import React from 'react';
import { a, b as c } from "./ab";
import * as ns from '../ns';
import type { T } from './types';
import './side-effect';
import Default, {
    named,
    other,
} from './multi';
"#;
        assert_eq!(
            scan(source),
            vec!["react", "./ab", "../ns", "./types", "./side-effect", "./multi"]
        );
    }

    #[test]
    fn export_from_and_calls() {
        let source = r#"
export * from './all';
export { x } from './x';
export const notAnImport = 'str';
const lazy = import('./lazy');
const legacy = require("./legacy");
import fs = require('fs');
"#;
        assert_eq!(
            scan(source),
            vec!["./all", "./x", "./lazy", "./legacy", "fs"]
        );
    }

    #[test]
    fn comments_are_ignored() {
        let source = r#"
// import gone from './line-comment';
/* import alsoGone from './block';
   import stillGone from './block2'; */
import kept from './kept';
"#;
        assert_eq!(scan(source), vec!["./kept"]);
    }

    #[test]
    fn member_access_is_not_an_import() {
        let source = "foo.import('./nope'); obj.require('./nope2');";
        assert!(scan(source).is_empty());
    }
}
