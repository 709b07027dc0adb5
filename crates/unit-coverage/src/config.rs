//! Coverage reporter configuration
//!
//! Mirrors the `unitCoverage` block of the host's configuration:
//!
//! ```yaml
//! reporter:
//!   type: lcov
//!   file: coverage/lcov.info
//!   additional: [lib, blocks]
//! instrumenter:
//!   sources: ["**/*.js"]
//!   tests: ["**/*.spec.js"]
//!   fileSetName: simple
//!   fileSetOptions: {}
//!   root: /path/to/project
//! ```
//!
//! Every key is optional.

use crate::error::{CoverageError, CoverageResult};
use crate::file_set::{FileSetOptions, SimpleFileSet};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Default report type
pub const DEFAULT_REPORTER: &str = "summary";

/// Default source pattern
pub const DEFAULT_SOURCE_PATTERN: &str = "**/*.js";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitCoverageConfig {
    /// Report output options
    pub reporter: ReporterConfig,
    /// Gap-filling instrumentation options
    pub instrumenter: InstrumenterConfig,
}

/// Report output options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Registered reporter name
    #[serde(rename = "type")]
    pub report_type: String,
    /// Output file; standard output when absent
    pub file: Option<PathBuf>,
    /// Extra source roots scanned for uncovered files, relative to the root
    #[serde(deserialize_with = "one_or_many")]
    pub additional: Vec<PathBuf>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            report_type: DEFAULT_REPORTER.to_string(),
            file: None,
            additional: Vec::new(),
        }
    }
}

/// Gap-filling instrumentation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstrumenterConfig {
    /// Patterns of test files, never synthesized as sources
    pub tests: Vec<String>,
    /// Patterns of instrumentable source files
    pub sources: Vec<String>,
    /// Registered file set name
    pub file_set_name: String,
    /// Options passed to the file set
    pub file_set_options: FileSetOptions,
    /// Project root; the working directory when absent
    pub root: Option<PathBuf>,
}

impl Default for InstrumenterConfig {
    fn default() -> Self {
        Self {
            tests: Vec::new(),
            sources: vec![DEFAULT_SOURCE_PATTERN.to_string()],
            file_set_name: SimpleFileSet::NAME.to_string(),
            file_set_options: FileSetOptions::new(),
            root: None,
        }
    }
}

impl InstrumenterConfig {
    /// The configured root, or the current working directory
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Io`] if the working directory is unavailable.
    pub fn resolve_root(&self) -> CoverageResult<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().map_err(|e| CoverageError::io(".", e)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(path)) => vec![path],
        Some(OneOrMany::Many(paths)) => paths,
    })
}

impl UnitCoverageConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Config`] on malformed JSON or mistyped keys.
    pub fn from_json_str(json: &str) -> CoverageResult<Self> {
        serde_json::from_str(json).map_err(|e| CoverageError::config(e.to_string()))
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Config`] on malformed YAML or mistyped keys.
    pub fn from_yaml_str(yaml: &str) -> CoverageResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| CoverageError::config(e.to_string()))
    }

    /// Load configuration from a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Io`] if the file cannot be read and
    /// [`CoverageError::Config`] for other extensions or invalid content.
    pub fn load(path: &Path) -> CoverageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoverageError::io(path, e))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            _ => Err(CoverageError::config(format!(
                "unsupported configuration file: {}",
                path.display()
            ))),
        }
    }

    /// Set the report type
    #[must_use]
    pub fn with_reporter_type(mut self, report_type: impl Into<String>) -> Self {
        self.reporter.report_type = report_type.into();
        self
    }

    /// Write the report to a file instead of standard output
    #[must_use]
    pub fn with_report_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.reporter.file = Some(file.into());
        self
    }

    /// Add an additional source root
    #[must_use]
    pub fn with_additional(mut self, path: impl Into<PathBuf>) -> Self {
        self.reporter.additional.push(path.into());
        self
    }

    /// Replace the source patterns
    #[must_use]
    pub fn with_sources<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.instrumenter.sources = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the test patterns
    #[must_use]
    pub fn with_tests<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.instrumenter.tests = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Select the file set and its options
    #[must_use]
    pub fn with_file_set(mut self, name: impl Into<String>, options: FileSetOptions) -> Self {
        self.instrumenter.file_set_name = name.into();
        self.instrumenter.file_set_options = options;
        self
    }

    /// Set the project root
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.instrumenter.root = Some(root.into());
        self
    }
}
