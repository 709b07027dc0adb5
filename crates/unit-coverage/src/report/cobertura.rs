//! Cobertura XML Coverage Report Formatter
//!
//! ## Cobertura XML Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!DOCTYPE coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd">
//! <coverage line-rate="0.8" branch-rate="0.5" version="1.0">
//!   <packages>
//!     <package name="lib" line-rate="0.8" branch-rate="0.5" complexity="0">
//!       <classes>
//!         <class name="util.js" filename="lib/util.js" line-rate="0.9" branch-rate="0.5" complexity="0">
//!           <lines>
//!             <line number="10" hits="5"/>
//!           </lines>
//!         </class>
//!       </classes>
//!     </package>
//!   </packages>
//! </coverage>
//! ```

use super::group_by_directory;
use crate::model::{CoverageModel, CoverageTotals};
use std::fmt::Write;

const FORMAT_VERSION: &str = "1.0";

/// Cobertura XML format report generator
#[derive(Debug)]
pub struct CoberturaFormatter<'a> {
    model: &'a CoverageModel,
}

impl<'a> CoberturaFormatter<'a> {
    /// Create a new Cobertura formatter
    #[must_use]
    pub fn new(model: &'a CoverageModel) -> Self {
        Self { model }
    }

    /// Generate Cobertura XML report as a string
    #[must_use]
    pub fn generate(&self) -> String {
        let totals = self.model.totals();

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<!DOCTYPE coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd">"#,
        );
        xml.push('\n');
        let _ = writeln!(
            xml,
            r#"<coverage line-rate="{:.4}" branch-rate="{:.4}" lines-covered="{}" lines-valid="{}" branches-covered="{}" branches-valid="{}" version="{}">"#,
            rate(totals.lines.hit, totals.lines.found),
            rate(totals.branches.hit, totals.branches.found),
            totals.lines.hit,
            totals.lines.found,
            totals.branches.hit,
            totals.branches.found,
            FORMAT_VERSION,
        );

        xml.push_str("  <packages>\n");

        for (package_name, paths) in group_by_directory(self.model) {
            let mut package_totals = CoverageTotals::default();
            for path in &paths {
                if let Some(file) = self.model.file(path) {
                    package_totals.add(&file.totals());
                }
            }

            let _ = writeln!(
                xml,
                r#"    <package name="{}" line-rate="{:.4}" branch-rate="{:.4}" complexity="0">"#,
                escape(package_name),
                rate(package_totals.lines.hit, package_totals.lines.found),
                rate(package_totals.branches.hit, package_totals.branches.found),
            );
            xml.push_str("      <classes>\n");

            for path in paths {
                let Some(file) = self.model.file(path) else {
                    continue;
                };
                let file_totals = file.totals();
                let class_name = path.rsplit_once('/').map_or(path, |(_, name)| name);

                let _ = writeln!(
                    xml,
                    r#"        <class name="{}" filename="{}" line-rate="{:.4}" branch-rate="{:.4}" complexity="0">"#,
                    escape(class_name),
                    escape(path),
                    rate(file_totals.lines.hit, file_totals.lines.found),
                    rate(file_totals.branches.hit, file_totals.branches.found),
                );
                xml.push_str("          <lines>\n");

                for (line, count) in &file.lines {
                    match file.branches.get(line) {
                        Some(arms) if !arms.is_empty() => {
                            let taken = arms.iter().filter(|&&c| c > 0).count();
                            let _ = writeln!(
                                xml,
                                r#"            <line number="{}" hits="{}" branch="true" condition-coverage="{}% ({}/{})"/>"#,
                                line,
                                count,
                                taken * 100 / arms.len(),
                                taken,
                                arms.len()
                            );
                        }
                        _ => {
                            let _ = writeln!(
                                xml,
                                r#"            <line number="{}" hits="{}"/>"#,
                                line, count
                            );
                        }
                    }
                }

                xml.push_str("          </lines>\n");
                xml.push_str("        </class>\n");
            }

            xml.push_str("      </classes>\n");
            xml.push_str("    </package>\n");
        }

        xml.push_str("  </packages>\n");
        xml.push_str("</coverage>\n");

        xml
    }
}

fn rate(hit: usize, found: usize) -> f64 {
    if found == 0 {
        return 1.0;
    }
    hit as f64 / found as f64
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
