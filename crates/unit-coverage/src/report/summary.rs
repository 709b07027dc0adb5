//! Text summary report.
//!
//! ```text
//! =============================== Coverage summary ===============================
//! Lines      : 66.67% ( 2/3 )
//! Functions  : 100.00% ( 1/1 )
//! Branches   : 50.00% ( 1/2 )
//! ================================================================================
//! File           | % Lines | % Funcs | % Branch
//! ---------------|---------|---------|---------
//! All files      |   66.67 |  100.00 |    50.00
//!  lib/util.js   |   50.00 |  100.00 |    50.00
//!  main.js       |  100.00 |  100.00 |   100.00
//! ```

use crate::model::{Counter, CoverageModel, CoverageTotals};
use std::fmt::Write;

const RULE_WIDTH: usize = 80;
const TITLE: &str = " Coverage summary ";

/// Plain-text summary report generator
#[derive(Debug)]
pub struct SummaryFormatter<'a> {
    model: &'a CoverageModel,
}

impl<'a> SummaryFormatter<'a> {
    /// Create a summary formatter
    #[must_use]
    pub fn new(model: &'a CoverageModel) -> Self {
        Self { model }
    }

    /// Render the summary
    #[must_use]
    pub fn generate(&self) -> String {
        let totals = self.model.totals();
        let mut out = String::new();

        let _ = writeln!(out, "{:=^width$}", TITLE, width = RULE_WIDTH);
        Self::write_total(&mut out, "Lines", totals.lines);
        Self::write_total(&mut out, "Functions", totals.functions);
        Self::write_total(&mut out, "Branches", totals.branches);
        let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

        let name_width = self
            .model
            .files()
            .map(|(path, _)| path.len() + 1)
            .chain(std::iter::once("All files".len()))
            .max()
            .unwrap_or(0);

        let _ = writeln!(out, "{:<name_width$} | % Lines | % Funcs | % Branch", "File");
        let _ = writeln!(out, "{}-|---------|---------|---------", "-".repeat(name_width));
        Self::write_row(&mut out, "All files", name_width, &totals);
        for (path, file) in self.model.files() {
            Self::write_row(&mut out, &format!(" {path}"), name_width, &file.totals());
        }

        out
    }

    fn write_total(out: &mut String, label: &str, counter: Counter) {
        let _ = writeln!(
            out,
            "{label:<11}: {:.2}% ( {}/{} )",
            counter.percent(),
            counter.hit,
            counter.found
        );
    }

    fn write_row(out: &mut String, name: &str, name_width: usize, totals: &CoverageTotals) {
        let _ = writeln!(
            out,
            "{name:<name_width$} | {:>7.2} | {:>7.2} | {:>8.2}",
            totals.lines.percent(),
            totals.functions.percent(),
            totals.branches.percent()
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn create_test_model() -> CoverageModel {
        let mut model = CoverageModel::new();
        let util = model.file_mut("lib/util.js");
        util.record_line(10, 5);
        util.record_line(12, 0);
        util.record_function("helper", 10, 5);
        util.record_branch(10, &[5, 0]);
        model.file_mut("main.js").record_line(1, 1);
        model
    }

    #[test]
    fn test_summary_totals() {
        let model = create_test_model();
        let output = SummaryFormatter::new(&model).generate();

        assert!(output.contains("Coverage summary"));
        assert!(output.contains("Lines      : 66.67% ( 2/3 )"));
        assert!(output.contains("Functions  : 100.00% ( 1/1 )"));
        assert!(output.contains("Branches   : 50.00% ( 1/2 )"));
    }

    #[test]
    fn test_summary_rows_per_file() {
        let model = create_test_model();
        let output = SummaryFormatter::new(&model).generate();

        let row = output.lines().find(|l| l.starts_with(" lib/util.js")).unwrap();
        assert!(row.contains("50.00"));
        assert!(output.lines().any(|l| l.starts_with(" main.js")));
        assert!(output.lines().any(|l| l.starts_with("All files")));
    }

    #[test]
    fn test_summary_of_empty_model_is_not_empty() {
        let model = CoverageModel::new();
        let output = SummaryFormatter::new(&model).generate();
        assert!(output.contains("Lines      : 100.00% ( 0/0 )"));
    }
}
