//! Glob matching for project-relative paths.
//!
//! Patterns follow minimatch conventions: `*` stays within one path segment,
//! `**` spans segments (including none) and wildcards skip dot-files.

use crate::error::{CoverageError, CoverageResult};
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// A compiled set of glob patterns
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    patterns: Vec<Pattern>,
}

impl PathMatcher {
    /// Compile a list of patterns
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Pattern`] for the first pattern that does
    /// not compile.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> CoverageResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|e| CoverageError::pattern(p, e.msg))
            })
            .collect::<CoverageResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether `path` matches at least one pattern
    #[must_use]
    pub fn matches_any(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches_with(path, MATCH_OPTIONS))
    }
}
