//! LCOV Report Formatter
//!
//! ## LCOV Format
//!
//! ```text
//! TN:<test name>
//! SF:<source file>
//! FN:<line>,<function name>
//! FNDA:<execution count>,<function name>
//! FNF:<functions found>
//! FNH:<functions hit>
//! BRDA:<line>,<block>,<branch>,<taken>
//! BRF:<branches found>
//! BRH:<branches hit>
//! DA:<line>,<execution count>
//! LF:<lines found>
//! LH:<lines hit>
//! end_of_record
//! ```

use crate::model::{CoverageModel, FileCoverage};
use std::fmt::Write;

/// LCOV format report generator
#[derive(Debug)]
pub struct LcovFormatter<'a> {
    model: &'a CoverageModel,
}

impl<'a> LcovFormatter<'a> {
    /// Create a new LCOV formatter from coverage data
    #[must_use]
    pub fn new(model: &'a CoverageModel) -> Self {
        Self { model }
    }

    /// Generate LCOV format report as a string
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        for (path, file) in self.model.files() {
            output.push_str("TN:\n");
            let _ = writeln!(output, "SF:{path}");

            // Functions, ordered by declaration line
            let mut functions: Vec<_> = file.functions.iter().collect();
            functions.sort_by(|a, b| (a.1.line, a.0).cmp(&(b.1.line, b.0)));
            for (name, hits) in &functions {
                let _ = writeln!(output, "FN:{},{name}", hits.line);
            }
            for (name, hits) in &functions {
                let _ = writeln!(output, "FNDA:{},{name}", hits.count);
            }

            let totals = file.totals();
            let _ = writeln!(output, "FNF:{}", totals.functions.found);
            let _ = writeln!(output, "FNH:{}", totals.functions.hit);

            for (block, (line, arms)) in file.branches.iter().enumerate() {
                for (branch, taken) in arms.iter().enumerate() {
                    // "-" marks a branch whose block never ran
                    let taken = if *taken == 0 && !Self::line_hit(file, *line) {
                        "-".to_string()
                    } else {
                        taken.to_string()
                    };
                    let _ = writeln!(output, "BRDA:{line},{block},{branch},{taken}");
                }
            }
            let _ = writeln!(output, "BRF:{}", totals.branches.found);
            let _ = writeln!(output, "BRH:{}", totals.branches.hit);

            for (line, count) in &file.lines {
                let _ = writeln!(output, "DA:{line},{count}");
            }
            let _ = writeln!(output, "LF:{}", totals.lines.found);
            let _ = writeln!(output, "LH:{}", totals.lines.hit);

            output.push_str("end_of_record\n");
        }

        output
    }

    fn line_hit(file: &FileCoverage, line: u32) -> bool {
        file.lines.get(&line).is_some_and(|&c| c > 0)
    }
}
