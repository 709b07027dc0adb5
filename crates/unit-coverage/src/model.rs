//! Coverage Model
//!
//! Per-file line, function and branch hit counts, decoded from the JSON
//! payload each browser reports and merged additively across browsers.
//!
//! ## Wire form
//!
//! ```text
//! { "files": { "lib/a.js": {
//!     "lines":     { "1": 3, "2": 0 },
//!     "functions": { "init": { "line": 1, "count": 3 } },
//!     "branches":  { "4": [1, 0] } } } }
//! ```
//!
//! Every section is optional. `null` decodes to the empty model.

use crate::error::{CoverageError, CoverageResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Hit count of a single function declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionHits {
    /// Line the function is declared on (1-indexed)
    #[serde(default)]
    pub line: u32,
    /// Number of times the function was called
    #[serde(default)]
    pub count: u64,
}

/// Coverage record for one source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCoverage {
    /// Hit count per executable line
    #[serde(default)]
    pub lines: BTreeMap<u32, u64>,
    /// Hit count per function, keyed by name
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionHits>,
    /// Hit count per branch arm, keyed by the line of the branch point
    #[serde(default)]
    pub branches: BTreeMap<u32, Vec<u64>>,
}

impl FileCoverage {
    /// Create an empty file record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add hits to a line
    pub fn record_line(&mut self, line: u32, count: u64) {
        let current = self.lines.entry(line).or_insert(0);
        *current = current.saturating_add(count);
    }

    /// Add hits to a function; the first recorded declaration line is kept
    pub fn record_function(&mut self, name: impl Into<String>, line: u32, count: u64) {
        let entry = self
            .functions
            .entry(name.into())
            .or_insert(FunctionHits { line, count: 0 });
        entry.count = entry.count.saturating_add(count);
    }

    /// Add per-arm hits to the branch point on `line`
    pub fn record_branch(&mut self, line: u32, arms: &[u64]) {
        let current = self.branches.entry(line).or_default();
        if current.len() < arms.len() {
            current.resize(arms.len(), 0);
        }
        for (slot, count) in current.iter_mut().zip(arms) {
            *slot = slot.saturating_add(*count);
        }
    }

    /// Merge another record for the same file into this one
    pub fn merge(&mut self, other: &Self) {
        for (line, count) in &other.lines {
            self.record_line(*line, *count);
        }
        for (name, hits) in &other.functions {
            self.record_function(name.clone(), hits.line, hits.count);
        }
        for (line, arms) in &other.branches {
            self.record_branch(*line, arms);
        }
    }

    /// Line, function and branch totals for this file
    #[must_use]
    pub fn totals(&self) -> CoverageTotals {
        CoverageTotals {
            lines: Counter::from_counts(self.lines.values().copied()),
            functions: Counter::from_counts(self.functions.values().map(|f| f.count)),
            branches: Counter::from_counts(self.branches.values().flatten().copied()),
        }
    }

    /// Whether any line, function or branch arm was executed
    #[must_use]
    pub fn was_executed(&self) -> bool {
        self.lines.values().any(|&c| c > 0)
            || self.functions.values().any(|f| f.count > 0)
            || self.branches.values().flatten().any(|&c| c > 0)
    }
}

/// Found/hit pair for one coverage dimension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    /// Number of items instrumented
    pub found: usize,
    /// Number of items executed at least once
    pub hit: usize,
}

impl Counter {
    fn from_counts(counts: impl Iterator<Item = u64>) -> Self {
        counts.fold(Self::default(), |mut acc, count| {
            acc.found += 1;
            if count > 0 {
                acc.hit += 1;
            }
            acc
        })
    }

    /// Coverage percentage; nothing found counts as fully covered
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.found == 0 {
            return 100.0;
        }
        (self.hit as f64 / self.found as f64) * 100.0
    }

    fn add(&mut self, other: Self) {
        self.found += other.found;
        self.hit += other.hit;
    }
}

/// Aggregated counters for a file or a whole model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageTotals {
    /// Executable lines
    pub lines: Counter,
    /// Function declarations
    pub functions: Counter,
    /// Branch arms
    pub branches: Counter,
}

impl CoverageTotals {
    /// Accumulate another set of totals
    pub fn add(&mut self, other: &Self) {
        self.lines.add(other.lines);
        self.functions.add(other.functions);
        self.branches.add(other.branches);
    }
}

/// Mergeable coverage for a set of files, keyed by project-relative path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageModel {
    #[serde(default)]
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageModel {
    /// Create an empty model
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a model from its wire form; `null` yields the empty model
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Decode`] if the value does not have the
    /// expected shape.
    pub fn from_json_value(value: &Value) -> CoverageResult<Self> {
        if value.is_null() {
            return Ok(Self::new());
        }
        Self::deserialize(value).map_err(|e| CoverageError::decode(e.to_string()))
    }

    /// Decode a model from JSON text; empty text yields the empty model
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Decode`] if the text is not JSON or not in
    /// the wire form.
    pub fn from_json_str(json: &str) -> CoverageResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value =
            serde_json::from_str(json).map_err(|e| CoverageError::decode(e.to_string()))?;
        Self::from_json_value(&value)
    }

    /// Serialize the model back to its wire form
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> CoverageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up the record for a file
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    /// Whether the model has a record for `path`
    #[must_use]
    pub fn contains_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Iterate over files in path order
    pub fn files(&self) -> impl Iterator<Item = (&str, &FileCoverage)> {
        self.files.iter().map(|(path, file)| (path.as_str(), file))
    }

    /// Paths of every file in the model
    #[must_use]
    pub fn file_names(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    /// Number of files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the model holds no files
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Mutable access to a file record, creating it if needed
    pub fn file_mut(&mut self, path: impl Into<String>) -> &mut FileCoverage {
        self.files.entry(path.into()).or_default()
    }

    /// Merge another model into this one
    ///
    /// Files only present in `other` are copied in; files present in both
    /// have their counts summed.
    pub fn merge(&mut self, other: &Self) {
        for (path, file) in &other.files {
            match self.files.entry(path.clone()) {
                Entry::Vacant(slot) => {
                    let _ = slot.insert(file.clone());
                }
                Entry::Occupied(mut slot) => slot.get_mut().merge(file),
            }
        }
    }

    /// Totals across all files
    #[must_use]
    pub fn totals(&self) -> CoverageTotals {
        let mut totals = CoverageTotals::default();
        for file in self.files.values() {
            totals.add(&file.totals());
        }
        totals
    }
}
