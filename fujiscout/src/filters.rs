//! File name filtering with glob patterns.
//!
//! Patterns apply to the bare file name, not to the full path, so `*` and `?`
//! never need to cross a separator. `[...]` character classes are supported;
//! recursive `**` is not meaningful for a single name.
use glob::{MatchOptions, Pattern};
use tracing::debug;

use crate::errors::{ScanError, ScanResult};

/// A compiled set of glob patterns matched against file names
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<Pattern>,
    options: MatchOptions,
}

impl PathFilter {
    /// Compiles `patterns`, trimming surrounding whitespace from each one.
    pub fn new(patterns: &[String], case_sensitive: bool) -> ScanResult<Self> {
        let patterns = patterns
            .iter()
            .map(|raw| {
                let trimmed = raw.trim();
                Pattern::new(trimmed)
                    .map_err(|e| ScanError::invalid_pattern(format!("{}: {}", trimmed, e.msg)))
            })
            .collect::<ScanResult<Vec<_>>>()?;

        Ok(Self {
            patterns,
            options: match_options(case_sensitive),
        })
    }

    /// Returns true if the file name matches any pattern
    pub fn matches(&self, file_name: &str) -> bool {
        let matched = self
            .patterns
            .iter()
            .any(|p| p.matches_with(file_name, self.options));
        debug!(file = file_name, matched, "Checked file name against patterns");
        matched
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn match_options(case_sensitive: bool) -> MatchOptions {
    MatchOptions {
        case_sensitive,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    }
}

/// Checks if a file name matches any of the given glob patterns.
///
/// Matching is case-sensitive. Patterns that fail to compile never match.
pub fn matches_any(file_name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        if let Ok(p) = Pattern::new(pattern.trim()) {
            p.matches_with(file_name, match_options(true))
        } else {
            false
        }
    })
}
