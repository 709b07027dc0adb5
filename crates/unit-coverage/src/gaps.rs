//! Gap-filling: zero-coverage entries for sources no browser loaded.

use crate::config::InstrumenterConfig;
use crate::discovery::{collect_files, relative_path};
use crate::error::{CoverageError, CoverageResult};
use crate::file_set::FileSetRegistry;
use crate::instrument::Instrumenter;
use crate::matcher::PathMatcher;
use crate::model::CoverageModel;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files under `additional` that are declared sources yet absent from `coverage`
///
/// A file qualifies when the coverage has no entry for its root-relative
/// path, it matches no test pattern and it matches at least one source
/// pattern. Results keep root-list order, then discovery order; a file
/// reachable from two roots is listed twice.
///
/// Roots are joined onto `root` with [`Path::join`], so an absolute entry
/// in `additional` is used as is.
pub fn uncovered_sources(
    coverage: &CoverageModel,
    root: &Path,
    additional: &[PathBuf],
    sources: &PathMatcher,
    tests: &PathMatcher,
) -> CoverageResult<Vec<PathBuf>> {
    let mut uncovered = Vec::new();
    for additional_path in additional {
        for file in collect_files(&root.join(additional_path))? {
            let relative = relative_path(root, &file);
            if !coverage.contains_file(&relative)
                && !tests.matches_any(&relative)
                && sources.matches_any(&relative)
            {
                uncovered.push(file);
            }
        }
    }
    Ok(uncovered)
}

/// Merge zero-coverage entries for every uncovered source into `coverage`
///
/// The file set and instrumenter are only built when there is at least one
/// file to synthesize. A file whose file-set key already has coverage is
/// skipped, so real data is never mixed with synthesized entries. Sources
/// are decoded as UTF-8, replacing invalid sequences. Returns the number of
/// synthesized fragments.
///
/// # Errors
///
/// Fails on unreadable roots or files, invalid patterns, an unknown file
/// set name or invalid file set options.
pub fn fill_gaps(
    coverage: &mut CoverageModel,
    config: &InstrumenterConfig,
    additional: &[PathBuf],
    file_sets: &FileSetRegistry,
) -> CoverageResult<usize> {
    if additional.is_empty() {
        return Ok(0);
    }

    let root = config.resolve_root()?;
    let sources = PathMatcher::new(&config.sources)?;
    let tests = PathMatcher::new(&config.tests)?;

    let files = uncovered_sources(coverage, &root, additional, &sources, &tests)?;
    if files.is_empty() {
        return Ok(0);
    }

    let mut file_set = file_sets
        .create(&config.file_set_name)
        .ok_or_else(|| CoverageError::file_set_not_found(&config.file_set_name))?;
    file_set.configure(&config.file_set_options)?;
    let instrumenter = Instrumenter::new(file_set, root)?;
    let covered: HashSet<String> = coverage.file_names().into_iter().map(str::to_owned).collect();

    let mut filled = 0;
    for file in &files {
        let key = instrumenter.source_name(file);
        if covered.contains(&key) {
            debug!(file = %file.display(), key = %key, "skipping source with real coverage");
            continue;
        }

        let bytes = std::fs::read(file).map_err(|e| CoverageError::io(file, e))?;
        let content = String::from_utf8_lossy(&bytes);
        debug!(file = %file.display(), "synthesizing zero coverage");
        coverage.merge(&instrumenter.generate_coverage(&content, file));
        filled += 1;
    }

    Ok(filled)
}
