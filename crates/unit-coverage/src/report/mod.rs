//! Coverage Reporters
//!
//! A reporter turns the final [`CoverageModel`] into report text. Reporters
//! are resolved by the configured `reporter.type` through a
//! [`ReporterRegistry`].
//!
//! Built-in report types:
//!
//! | name        | output                                          |
//! |-------------|-------------------------------------------------|
//! | `summary`   | per-file table of line/function/branch coverage |
//! | `lcov`      | LCOV tracefile                                  |
//! | `cobertura` | Cobertura XML                                   |
//! | `json`      | the coverage wire form, pretty-printed          |

mod cobertura;
mod lcov;
mod summary;

pub use cobertura::CoberturaFormatter;
pub use lcov::LcovFormatter;
pub use summary::SummaryFormatter;

use crate::error::CoverageResult;
use crate::model::CoverageModel;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Rendering function for one report type
pub type ReporterFn = Arc<dyn Fn(&CoverageModel) -> CoverageResult<String> + Send + Sync>;

/// Name to rendering-function mapping
#[derive(Clone)]
pub struct ReporterRegistry {
    reporters: BTreeMap<String, ReporterFn>,
}

impl ReporterRegistry {
    /// Registry with no reporters
    #[must_use]
    pub fn empty() -> Self {
        Self {
            reporters: BTreeMap::new(),
        }
    }

    /// Registry with the built-in reporters
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("summary", |model| Ok(SummaryFormatter::new(model).generate()));
        registry.register("lcov", |model| Ok(LcovFormatter::new(model).generate()));
        registry.register("cobertura", |model| {
            Ok(CoberturaFormatter::new(model).generate())
        });
        registry.register("json", CoverageModel::to_json_pretty);
        registry
    }

    /// Register (or replace) a reporter
    pub fn register<F>(&mut self, name: impl Into<String>, reporter: F)
    where
        F: Fn(&CoverageModel) -> CoverageResult<String> + Send + Sync + 'static,
    {
        let _ = self.reporters.insert(name.into(), Arc::new(reporter));
    }

    /// Look up the reporter registered under `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ReporterFn> {
        self.reporters.get(name).cloned()
    }

    /// Registered names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.reporters.keys().map(String::as_str).collect()
    }
}

impl Default for ReporterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ReporterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Group files by their directory, `"."` for files at the root
pub(crate) fn group_by_directory(model: &CoverageModel) -> BTreeMap<&str, Vec<&str>> {
    let mut packages: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (path, _) in model.files() {
        let package = path.rsplit_once('/').map_or(".", |(dir, _)| dir);
        packages.entry(package).or_default().push(path);
    }
    packages
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_reporters() {
        let registry = ReporterRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["cobertura", "json", "lcov", "summary"]);
    }

    #[test]
    fn test_unknown_reporter_is_none() {
        assert!(ReporterRegistry::with_defaults().get("html").is_none());
    }

    #[test]
    fn test_custom_reporter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut registry = ReporterRegistry::empty();
        registry.register("count", move |model| {
            let _ = seen.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{} files", model.len()))
        });

        let reporter = registry.get("count").unwrap();
        assert_eq!(reporter(&CoverageModel::new()).unwrap(), "0 files");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_json_reporter_is_wire_form() {
        let mut model = CoverageModel::new();
        model.file_mut("a.js").record_line(1, 2);
        let output = ReporterRegistry::with_defaults().get("json").unwrap()(&model).unwrap();
        assert_eq!(CoverageModel::from_json_str(&output).unwrap(), model);
    }

    #[test]
    fn test_group_by_directory() {
        let mut model = CoverageModel::new();
        let _ = model.file_mut("a.js");
        let _ = model.file_mut("lib/b.js");
        let _ = model.file_mut("lib/c.js");

        let groups = group_by_directory(&model);
        assert_eq!(groups["."], vec!["a.js"]);
        assert_eq!(groups["lib"], vec!["lib/b.js", "lib/c.js"]);
    }
}
