//! Zero-coverage instrumentation for sources no test touched.
//!
//! The instrumenter does not rewrite code. It scans the source text for
//! executable lines, function declarations and branch points and records
//! each of them with a hit count of zero, which is exactly what a file
//! that was never loaded in any browser would have reported.

use crate::discovery::relative_path;
use crate::error::{CoverageError, CoverageResult};
use crate::file_set::FileSet;
use crate::model::CoverageModel;
use regex::Regex;
use std::path::{Path, PathBuf};

const FUNCTION_PATTERN: &str = r"(?:([A-Za-z_$][\w$]*)\s*[:=]\s*)?(?:async\s+)?\bfunction\b\s*\*?\s*([A-Za-z_$][\w$]*)?\s*\(";
const ARROW_PATTERN: &str =
    r"(?:([A-Za-z_$][\w$]*)\s*=\s*)?(?:async\s*)?(?:\([^()]*\)|\b[A-Za-z_$][\w$]*)\s*=>";
const IF_PATTERN: &str = r"\bif\s*\(";
const TERNARY_PATTERN: &str = r"(?:^|[^?])\?(?:[^?.:]|$)";
const CASE_PATTERN: &str = r"\bcase\b[^:]*:|\bdefault\s*:";

/// Compiled patterns for recognizing coverage points in source text
#[derive(Debug, Clone)]
struct SourceScanner {
    function: Regex,
    arrow: Regex,
    branch_if: Regex,
    ternary: Regex,
    case: Regex,
}

impl SourceScanner {
    fn new() -> CoverageResult<Self> {
        let compile =
            |p: &str| Regex::new(p).map_err(|e| CoverageError::pattern(p, e.to_string()));
        Ok(Self {
            function: compile(FUNCTION_PATTERN)?,
            arrow: compile(ARROW_PATTERN)?,
            branch_if: compile(IF_PATTERN)?,
            ternary: compile(TERNARY_PATTERN)?,
            case: compile(CASE_PATTERN)?,
        })
    }

    /// Function names declared on a line of code, anonymous ones as `None`
    fn functions<'a>(&self, code: &'a str) -> Vec<Option<&'a str>> {
        let mut names: Vec<Option<&str>> = self
            .function
            .captures_iter(code)
            .map(|caps| caps.get(2).or_else(|| caps.get(1)).map(|m| m.as_str()))
            .collect();
        names.extend(
            self.arrow
                .captures_iter(code)
                .map(|caps| caps.get(1).map(|m| m.as_str())),
        );
        names
    }

    /// Number of branch arms starting on a line of code
    fn branch_arms(&self, code: &str) -> usize {
        let two_way = self.branch_if.find_iter(code).count() + self.ternary.find_iter(code).count();
        two_way * 2 + self.case.find_iter(code).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ScanState {
    #[default]
    Code,
    BlockComment,
    Quoted(char),
}

/// Strips comments from source lines, tracking block comments and
/// template literals across lines
///
/// String literal contents are dropped as well, leaving just the quotes,
/// so comment markers and operators inside strings are never scanned.
#[derive(Debug, Default)]
struct CommentStripper {
    state: ScanState,
}

impl CommentStripper {
    fn strip(&mut self, line: &str) -> String {
        let mut code = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match self.state {
                ScanState::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        let _ = chars.next();
                        self.state = ScanState::Code;
                    }
                }
                ScanState::Quoted(quote) => {
                    if c == '\\' {
                        let _ = chars.next();
                    } else if c == quote {
                        code.push(c);
                        self.state = ScanState::Code;
                    }
                }
                ScanState::Code => match c {
                    '/' if chars.peek() == Some(&'/') => break,
                    '/' if chars.peek() == Some(&'*') => {
                        let _ = chars.next();
                        code.push(' ');
                        self.state = ScanState::BlockComment;
                    }
                    '"' | '\'' | '`' => {
                        code.push(c);
                        self.state = ScanState::Quoted(c);
                    }
                    _ => code.push(c),
                },
            }
        }

        // Only template literals span lines
        if matches!(self.state, ScanState::Quoted('"' | '\'')) {
            self.state = ScanState::Code;
        }

        code
    }
}

fn is_executable(code: &str) -> bool {
    code.chars()
        .any(|c| !c.is_whitespace() && !matches!(c, '{' | '}' | '(' | ')' | '[' | ']' | ';' | ','))
}

/// Generates zero-count coverage for uninstrumented sources
#[derive(Debug)]
pub struct Instrumenter {
    file_set: Box<dyn FileSet>,
    root: PathBuf,
    scanner: SourceScanner,
}

impl Instrumenter {
    /// Create an instrumenter keyed through `file_set`, resolving paths against `root`
    pub fn new(file_set: Box<dyn FileSet>, root: impl Into<PathBuf>) -> CoverageResult<Self> {
        Ok(Self {
            file_set,
            root: root.into(),
            scanner: SourceScanner::new()?,
        })
    }

    /// Coverage key the file set assigns to `filename`
    #[must_use]
    pub fn source_name(&self, filename: &Path) -> String {
        self.file_set.source_name(&relative_path(&self.root, filename))
    }

    /// Build a model with one zero-coverage entry for `filename`
    #[must_use]
    pub fn generate_coverage(&self, content: &str, filename: &Path) -> CoverageModel {
        let mut model = CoverageModel::new();
        let file = model.file_mut(self.source_name(filename));
        let mut stripper = CommentStripper::default();
        let mut anonymous = 0usize;

        for (index, line) in content.lines().enumerate() {
            let number = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let code = stripper.strip(line);
            if !is_executable(&code) {
                continue;
            }

            file.record_line(number, 0);

            for name in self.scanner.functions(&code) {
                match name {
                    Some(name) => file.record_function(name, number, 0),
                    None => {
                        file.record_function(format!("(anonymous_{anonymous})"), number, 0);
                        anonymous += 1;
                    }
                }
            }

            let arms = self.scanner.branch_arms(&code);
            if arms > 0 {
                file.record_branch(number, &vec![0; arms]);
            }
        }

        model
    }
}
