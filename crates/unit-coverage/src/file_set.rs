//! File set capabilities.
//!
//! A file set decides how a source file found under the instrumenter root is
//! named inside the coverage model. File sets are looked up by name in a
//! [`FileSetRegistry`] and configured from the opaque `fileSetOptions` bag.

use crate::error::{CoverageError, CoverageResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque options passed through to a file set
pub type FileSetOptions = Map<String, Value>;

/// Pluggable strategy for interpreting source files
pub trait FileSet: fmt::Debug {
    /// Apply user-supplied options
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Config`] if an option has the wrong type.
    fn configure(&mut self, options: &FileSetOptions) -> CoverageResult<()>;

    /// Coverage key for a file, given its `/`-separated root-relative path
    fn source_name(&self, relative_path: &str) -> String;
}

/// Keys files by their root-relative path
///
/// Option `stripPrefix` removes a leading path prefix, e.g. when sources
/// are served from a build directory.
#[derive(Debug, Clone, Default)]
pub struct SimpleFileSet {
    strip_prefix: Option<String>,
}

impl SimpleFileSet {
    /// Registry name of this file set
    pub const NAME: &'static str = "simple";

    /// Create an unconfigured simple file set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSet for SimpleFileSet {
    fn configure(&mut self, options: &FileSetOptions) -> CoverageResult<()> {
        self.strip_prefix = match options.get("stripPrefix") {
            None | Some(Value::Null) => None,
            Some(Value::String(prefix)) => {
                let prefix = prefix.trim_end_matches('/');
                (!prefix.is_empty()).then(|| format!("{prefix}/"))
            }
            Some(other) => {
                return Err(CoverageError::config(format!(
                    "file set \"{}\": stripPrefix must be a string, got {other}",
                    Self::NAME
                )))
            }
        };
        Ok(())
    }

    fn source_name(&self, relative_path: &str) -> String {
        match &self.strip_prefix {
            Some(prefix) => relative_path
                .strip_prefix(prefix.as_str())
                .unwrap_or(relative_path)
                .to_string(),
            None => relative_path.to_string(),
        }
    }
}

/// Creates a fresh file set instance
pub type FileSetFactory = fn() -> Box<dyn FileSet>;

/// Name to file-set-factory mapping
#[derive(Clone)]
pub struct FileSetRegistry {
    factories: BTreeMap<String, FileSetFactory>,
}

impl FileSetRegistry {
    /// Registry with no file sets
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the built-in `simple` file set
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(SimpleFileSet::NAME, || Box::new(SimpleFileSet::new()));
        registry
    }

    /// Register (or replace) a file set factory
    pub fn register(&mut self, name: impl Into<String>, factory: FileSetFactory) {
        let _ = self.factories.insert(name.into(), factory);
    }

    /// Instantiate the file set registered under `name`
    #[must_use]
    pub fn create(&self, name: &str) -> Option<Box<dyn FileSet>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Registered names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for FileSetRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for FileSetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSetRegistry")
            .field("names", &self.names())
            .finish()
    }
}
