//! Source file enumeration.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::WorkflowError;
use crate::utils::glob::GlobPattern;
use crate::utils::path::to_slash;

/// Files under `root` whose `/`-separated relative path matches `pattern`.
///
/// Returns relative paths, sorted. A missing root or an unreadable
/// directory fails the whole enumeration.
pub fn discover(root: &Path, pattern: &GlobPattern) -> Result<Vec<PathBuf>, WorkflowError> {
    if !root.is_dir() {
        return Err(WorkflowError::Discover {
            root: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| WorkflowError::Discover {
            root: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if pattern.matches(&to_slash(relative)) {
            files.push(relative.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
