//! Source file discovery.
//!
//! Lists every file beneath a root, depth-first, and expresses discovered
//! paths relative to the instrumenter root.

use crate::error::{CoverageError, CoverageResult};
use std::path::{Component, Path, PathBuf};

/// Recursively collect every file beneath `root`
///
/// A root that is itself a file yields just that file. Entries of each
/// directory are visited in file-name order. Symlinks are followed.
///
/// # Errors
///
/// Returns an error if `root` or any nested directory cannot be read.
pub fn collect_files(root: &Path) -> CoverageResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files_recursive(root, &mut files)?;
    Ok(files)
}

fn collect_files_recursive(path: &Path, files: &mut Vec<PathBuf>) -> CoverageResult<()> {
    let metadata = std::fs::metadata(path).map_err(|e| CoverageError::io(path, e))?;

    if !metadata.is_dir() {
        files.push(path.to_path_buf());
        return Ok(());
    }

    let mut entries = std::fs::read_dir(path)
        .map_err(|e| CoverageError::io(path, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CoverageError::io(path, e))?;
    entries.sort();

    for child in entries {
        collect_files_recursive(&child, files)?;
    }

    Ok(())
}

/// Express `path` relative to `base` using `/` separators
///
/// Both paths are normalized lexically first. Paths outside `base` get
/// leading `..` segments.
#[must_use]
pub fn relative_path(base: &Path, path: &Path) -> String {
    let base = normalize(base);
    let path = normalize(path);

    let common = base
        .iter()
        .zip(path.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..base.len() {
        segments.push("..".to_string());
    }
    segments.extend(path[common..].iter().cloned());
    segments.join("/")
}

fn normalize(path: &Path) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(last) if last != "..") {
                    let _ = parts.pop();
                } else {
                    parts.push("..".to_string());
                }
            }
            Component::RootDir => parts.push(String::from("/")),
            Component::Prefix(prefix) => {
                parts.push(prefix.as_os_str().to_string_lossy().into_owned());
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
        }
    }
    parts
}
