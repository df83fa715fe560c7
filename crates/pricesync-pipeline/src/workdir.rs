//! Download directory housekeeping.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Every `.xml` file under `dir`, recursively, sorted by path.
///
/// The extension match is case-insensitive. A missing or empty directory
/// yields an empty list and a `warn!`.
#[must_use]
pub fn collect_xml_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_xml(dir, &mut files);
    files.sort();

    if files.is_empty() {
        tracing::warn!(dir = %dir.display(), "no XML files found");
    }
    files
}

fn walk_xml(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_xml(&path, out);
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            out.push(path);
        }
    }
}

/// Delete every file under `dir`, recursively, leaving the folders in place.
///
/// Returns the number of files removed. A missing directory removes nothing.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if a directory cannot be listed or a file
/// cannot be removed.
pub fn clear_directory(dir: &Path) -> Result<u64, PipelineError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(PipelineError::io(dir, e)),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_dir() {
            removed += clear_directory(&path)?;
        } else {
            fs::remove_file(&path).map_err(|e| PipelineError::io(&path, e))?;
            removed += 1;
        }
    }
    Ok(removed)
}
