//! Recognition of the checker's build-complete line.

use regex::Regex;

const COMPLETION_PATTERN: &str = r"(?i)Found (\d+) errors?\. Watching for file changes\.";

/// Matches `Found <N> error(s). Watching for file changes.` anywhere in a
/// line of checker output.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    pattern: Regex,
}

impl CompletionSignal {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(CompletionSignal {
            pattern: Regex::new(COMPLETION_PATTERN)?,
        })
    }

    /// The error count carried by `line`, if it is a completion line.
    pub fn parse(&self, line: &str) -> Option<u32> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|count| count.as_str().parse().ok())
    }
}
