//! Unit Coverage: Run-Level Coverage Reporting for Browser Test Runners
//!
//! Browsers running instrumented unit tests each deliver a coverage
//! payload when they finish. This crate merges those payloads into one
//! model, adds zero-coverage entries for source files no browser ever
//! loaded, and renders the result through a named reporter.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      UNIT COVERAGE Pipeline                      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  browser done ──► record_browser_result ──► per-browser models   │
//! │                                                 │                │
//! │  run done ──────► finalize_run ──► merge ──► resolve reporter    │
//! │                                                 │                │
//! │            discovery + matcher ──► fill_gaps (instrumenter)      │
//! │                                                 │                │
//! │                      reporter ──► report file / console          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use unit_coverage::{CoverageAggregator, UnitCoverageConfig};
//!
//! # fn main() -> unit_coverage::CoverageResult<()> {
//! let config = UnitCoverageConfig::new()
//!     .with_reporter_type("lcov")
//!     .with_report_file("coverage/lcov.info")
//!     .with_additional("lib");
//!
//! let mut aggregator = CoverageAggregator::new(config);
//! let payload = json!({ "files": { "lib/a.js": { "lines": { "1": 3 } } } });
//! aggregator.record_browser_result("chrome-1", Some(&payload))?;
//! let outcome = aggregator.finalize_run(["chrome-1"])?;
//! assert!(outcome.is_reported());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod aggregator;
mod config;
mod error;
mod file_set;
mod gaps;
mod model;

pub mod discovery;
pub mod instrument;
pub mod logging;
pub mod matcher;
pub mod report;

pub use aggregator::{
    BrowserResult, CoverageAggregator, CoveragePayload, ReportDestination, RunOutcome,
};
pub use config::{
    InstrumenterConfig, ReporterConfig, UnitCoverageConfig, DEFAULT_REPORTER,
    DEFAULT_SOURCE_PATTERN,
};
pub use error::{CoverageError, CoverageResult};
pub use file_set::{FileSet, FileSetFactory, FileSetOptions, FileSetRegistry, SimpleFileSet};
pub use gaps::{fill_gaps, uncovered_sources};
pub use instrument::Instrumenter;
pub use matcher::PathMatcher;
pub use model::{Counter, CoverageModel, CoverageTotals, FileCoverage, FunctionHits};
pub use report::{
    CoberturaFormatter, LcovFormatter, ReporterFn, ReporterRegistry, SummaryFormatter,
};
