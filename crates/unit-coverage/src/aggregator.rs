//! Per-run coverage aggregation.
//!
//! The host test runner drives a [`CoverageAggregator`] through two
//! notifications:
//!
//! 1. [`CoverageAggregator::record_browser_result`] once per browser as it
//!    finishes, carrying that browser's raw coverage payload (if any).
//! 2. [`CoverageAggregator::finalize_run`] once the whole run completes,
//!    with the ids of every participating browser.
//!
//! Finalizing merges the stored coverages, fills gaps for source files no
//! browser loaded and renders the configured report.

use crate::config::UnitCoverageConfig;
use crate::error::{CoverageError, CoverageResult};
use crate::file_set::FileSetRegistry;
use crate::gaps::fill_gaps;
use crate::model::CoverageModel;
use crate::report::ReporterRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Completion notification for one browser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserResult {
    /// Coverage collected in the browser, absent when sources were not instrumented
    #[serde(default)]
    pub coverage: Option<CoveragePayload>,
}

/// Envelope around the raw coverage value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoveragePayload {
    /// Coverage in the wire form understood by [`CoverageModel::from_json_value`]
    #[serde(default)]
    pub data: Value,
}

/// Where a rendered report went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDestination {
    /// Written to this file
    File(PathBuf),
    /// Written to the console sink
    Console,
}

/// Result of finalizing a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No browser delivered coverage; nothing was reported
    NoCoverage,
    /// The configured report type is not registered; nothing was reported
    ReporterNotFound {
        /// The unknown report type
        report_type: String,
        /// Merged coverage, without gap-filling
        coverage: CoverageModel,
    },
    /// A report was rendered and written
    Reported {
        /// Final coverage, gap-filled
        coverage: CoverageModel,
        /// Where the report was written
        destination: ReportDestination,
    },
}

impl RunOutcome {
    /// The final coverage, if any browser delivered some
    #[must_use]
    pub fn coverage(&self) -> Option<&CoverageModel> {
        match self {
            Self::NoCoverage => None,
            Self::ReporterNotFound { coverage, .. } | Self::Reported { coverage, .. } => {
                Some(coverage)
            }
        }
    }

    /// Whether a report was written
    #[must_use]
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Reported { .. })
    }
}

/// Collects per-browser coverage and produces the run report
pub struct CoverageAggregator {
    config: UnitCoverageConfig,
    reporters: ReporterRegistry,
    file_sets: FileSetRegistry,
    console: Box<dyn Write + Send>,
    browser_coverages: HashMap<String, CoverageModel>,
}

impl CoverageAggregator {
    /// Create an aggregator with the built-in reporters and file sets,
    /// printing console reports to standard output
    #[must_use]
    pub fn new(config: UnitCoverageConfig) -> Self {
        Self {
            config,
            reporters: ReporterRegistry::with_defaults(),
            file_sets: FileSetRegistry::with_defaults(),
            console: Box::new(std::io::stdout()),
            browser_coverages: HashMap::new(),
        }
    }

    /// Replace the reporter registry
    #[must_use]
    pub fn with_reporters(mut self, reporters: ReporterRegistry) -> Self {
        self.reporters = reporters;
        self
    }

    /// Replace the file set registry
    #[must_use]
    pub fn with_file_sets(mut self, file_sets: FileSetRegistry) -> Self {
        self.file_sets = file_sets;
        self
    }

    /// Send console reports to `console` instead of standard output
    #[must_use]
    pub fn with_console(mut self, console: impl Write + Send + 'static) -> Self {
        self.console = Box::new(console);
        self
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &UnitCoverageConfig {
        &self.config
    }

    /// Ids of browsers whose coverage awaits finalization, sorted
    #[must_use]
    pub fn pending_browsers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.browser_coverages.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Stored coverage for one browser
    #[must_use]
    pub fn browser_coverage(&self, browser_id: &str) -> Option<&CoverageModel> {
        self.browser_coverages.get(browser_id)
    }

    /// Record the coverage payload of a finished browser
    ///
    /// An absent payload is logged and leaves any previous entry untouched.
    /// A later payload for the same id replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Decode`] if the payload is not valid coverage.
    pub fn record_browser_result(
        &mut self,
        browser_id: impl Into<String>,
        payload: Option<&Value>,
    ) -> CoverageResult<()> {
        let browser_id = browser_id.into();
        let Some(payload) = payload else {
            error!("Coverage data was not found. Source files were not instrumented.");
            return Ok(());
        };

        let coverage = CoverageModel::from_json_value(payload)?;
        debug!(browser = %browser_id, files = coverage.len(), "recorded browser coverage");
        let _ = self.browser_coverages.insert(browser_id, coverage);
        Ok(())
    }

    /// Record a completion notification
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Decode`] if the payload is not valid coverage.
    pub fn record_browser_completion(
        &mut self,
        browser_id: impl Into<String>,
        result: &BrowserResult,
    ) -> CoverageResult<()> {
        self.record_browser_result(browser_id, result.coverage.as_ref().map(|c| &c.data))
    }

    /// Merge the coverage of `browser_ids` and emit the report
    ///
    /// Stored entries for the given ids are consumed in order; unknown ids
    /// are skipped. The reporter is resolved before any gap-filling, so an
    /// unknown report type does no file-system work.
    ///
    /// # Errors
    ///
    /// Fails if gap-filling fails, the reporter fails or the report cannot
    /// be written.
    pub fn finalize_run<I, S>(&mut self, browser_ids: I) -> CoverageResult<RunOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut coverage: Option<CoverageModel> = None;
        for id in browser_ids {
            let Some(browser_coverage) = self.browser_coverages.remove(id.as_ref()) else {
                continue;
            };
            match coverage.as_mut() {
                Some(merged) => merged.merge(&browser_coverage),
                None => coverage = Some(browser_coverage),
            }
        }

        let Some(mut coverage) = coverage else {
            return Ok(RunOutcome::NoCoverage);
        };

        let report_type = self.config.reporter.report_type.clone();
        let Some(reporter) = self.reporters.get(&report_type) else {
            error!("Reporter \"{}\" was not found", report_type);
            return Ok(RunOutcome::ReporterNotFound {
                report_type,
                coverage,
            });
        };

        let filled = fill_gaps(
            &mut coverage,
            &self.config.instrumenter,
            &self.config.reporter.additional,
            &self.file_sets,
        )?;
        if filled > 0 {
            debug!(files = filled, "filled coverage gaps");
        }

        let content = reporter(&coverage)?;
        let destination = self.write_report(&content)?;

        Ok(RunOutcome::Reported {
            coverage,
            destination,
        })
    }

    fn write_report(&mut self, content: &str) -> CoverageResult<ReportDestination> {
        match &self.config.reporter.file {
            Some(path) => {
                std::fs::write(path, content).map_err(|e| CoverageError::io(path, e))?;
                info!("Coverage report was saved: {}", path.display());
                Ok(ReportDestination::File(path.clone()))
            }
            None => {
                writeln!(self.console, "{content}").map_err(CoverageError::Console)?;
                self.console.flush().map_err(CoverageError::Console)?;
                Ok(ReportDestination::Console)
            }
        }
    }
}

impl fmt::Debug for CoverageAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoverageAggregator")
            .field("config", &self.config)
            .field("reporters", &self.reporters)
            .field("file_sets", &self.file_sets)
            .field("pending", &self.pending_browsers())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn payload(path: &str, line: &str, count: u64) -> Value {
        json!({ "files": { path: { "lines": { line: count } } } })
    }

    fn aggregator(config: UnitCoverageConfig) -> (CoverageAggregator, SharedBuffer) {
        let console = SharedBuffer::default();
        let aggregator = CoverageAggregator::new(config).with_console(console.clone());
        (aggregator, console)
    }

    #[test]
    fn test_record_stores_per_browser() {
        let (mut agg, _) = aggregator(UnitCoverageConfig::default());
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();
        agg.record_browser_result("b2", None).unwrap();

        assert_eq!(agg.pending_browsers(), vec!["b1"]);
        assert_eq!(agg.browser_coverage("b1").unwrap().file("a.js").unwrap().lines[&1], 2);
    }

    #[test]
    fn test_record_replaces_earlier_payload() {
        let (mut agg, _) = aggregator(UnitCoverageConfig::default());
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 7))).unwrap();
        assert_eq!(agg.browser_coverage("b1").unwrap().file("a.js").unwrap().lines[&1], 7);
    }

    #[test]
    fn test_absent_payload_keeps_earlier_entry() {
        let (mut agg, _) = aggregator(UnitCoverageConfig::default());
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();
        agg.record_browser_result("b1", None).unwrap();
        assert!(agg.browser_coverage("b1").is_some());
    }

    #[test]
    fn test_malformed_payload_is_decode_error() {
        let (mut agg, _) = aggregator(UnitCoverageConfig::default());
        let err = agg.record_browser_result("b1", Some(&json!({ "files": 5 }))).unwrap_err();
        assert!(matches!(err, CoverageError::Decode { .. }));
        assert!(agg.pending_browsers().is_empty());
    }

    #[test]
    fn test_record_completion_envelope() {
        let result: BrowserResult =
            serde_json::from_value(json!({ "coverage": { "data": payload("a.js", "3", 1) } }))
                .unwrap();
        let (mut agg, _) = aggregator(UnitCoverageConfig::default());
        agg.record_browser_completion("b1", &result).unwrap();
        agg.record_browser_completion("b2", &BrowserResult::default()).unwrap();
        assert_eq!(agg.pending_browsers(), vec!["b1"]);
    }

    #[test]
    fn test_finalize_without_coverage() {
        let (mut agg, console) = aggregator(UnitCoverageConfig::default());
        let outcome = agg.finalize_run(["b1", "b2"]).unwrap();
        assert_eq!(outcome, RunOutcome::NoCoverage);
        assert!(outcome.coverage().is_none());
        assert!(console.contents().is_empty());
    }

    #[test]
    fn test_finalize_merges_and_prints() {
        let (mut agg, console) =
            aggregator(UnitCoverageConfig::default().with_reporter_type("json"));
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();
        agg.record_browser_result("b2", Some(&payload("a.js", "1", 3))).unwrap();

        let outcome = agg.finalize_run(["b1", "b2"]).unwrap();

        assert!(outcome.is_reported());
        assert_eq!(outcome.coverage().unwrap().file("a.js").unwrap().lines[&1], 5);
        let printed = console.contents();
        assert!(printed.ends_with("}\n"));
        let reparsed = CoverageModel::from_json_str(&printed).unwrap();
        assert_eq!(&reparsed, outcome.coverage().unwrap());
    }

    #[test]
    fn test_finalize_consumes_entries() {
        let (mut agg, _) = aggregator(UnitCoverageConfig::default());
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();
        agg.record_browser_result("b2", Some(&payload("b.js", "1", 1))).unwrap();

        let outcome = agg.finalize_run(["b1", "unknown"]).unwrap();
        assert_eq!(outcome.coverage().unwrap().file_names(), vec!["a.js"]);
        assert_eq!(agg.pending_browsers(), vec!["b2"]);

        assert_eq!(agg.finalize_run(["b1"]).unwrap(), RunOutcome::NoCoverage);
    }

    #[test]
    fn test_unknown_reporter_skips_report() {
        let (mut agg, console) =
            aggregator(UnitCoverageConfig::default().with_reporter_type("html"));
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();

        let outcome = agg.finalize_run(["b1"]).unwrap();

        match outcome {
            RunOutcome::ReporterNotFound { report_type, coverage } => {
                assert_eq!(report_type, "html");
                assert_eq!(coverage.len(), 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(console.contents().is_empty());
    }

    #[test]
    fn test_unknown_reporter_skips_gap_filling() {
        let config = UnitCoverageConfig::default()
            .with_reporter_type("html")
            .with_root("/nonexistent/project")
            .with_additional("lib");
        let (mut agg, _) = aggregator(config);
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();

        assert!(matches!(
            agg.finalize_run(["b1"]).unwrap(),
            RunOutcome::ReporterNotFound { .. }
        ));
    }

    #[test]
    fn test_reporter_error_propagates() {
        let mut reporters = ReporterRegistry::empty();
        reporters.register("broken", |_| Err(CoverageError::config("cannot render")));
        let (agg, console) = aggregator(UnitCoverageConfig::default().with_reporter_type("broken"));
        let mut agg = agg.with_reporters(reporters);
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();

        let err = agg.finalize_run(["b1"]).unwrap_err();
        assert!(matches!(err, CoverageError::Config { .. }));
        assert!(console.contents().is_empty());
    }

    #[test]
    fn test_report_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.txt");
        let (mut agg, console) =
            aggregator(UnitCoverageConfig::default().with_report_file(&out));
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();

        let outcome = agg.finalize_run(["b1"]).unwrap();

        match outcome {
            RunOutcome::Reported { destination, .. } => {
                assert_eq!(destination, ReportDestination::File(out.clone()));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(std::fs::read_to_string(&out).unwrap().contains("Coverage summary"));
        assert!(console.contents().is_empty());
    }

    #[test]
    fn test_unwritable_report_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing").join("report.txt");
        let (mut agg, _) = aggregator(UnitCoverageConfig::default().with_report_file(&out));
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();

        let err = agg.finalize_run(["b1"]).unwrap_err();
        assert!(matches!(err, CoverageError::Io { .. }));
    }

    #[test]
    fn test_debug_lists_pending_browsers() {
        let (mut agg, _) = aggregator(UnitCoverageConfig::default());
        agg.record_browser_result("b1", Some(&payload("a.js", "1", 2))).unwrap();
        let debug = format!("{agg:?}");
        assert!(debug.contains("CoverageAggregator"));
        assert!(debug.contains("b1"));
    }
}
