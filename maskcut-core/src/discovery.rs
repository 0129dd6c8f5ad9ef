//! File discovery module for finding video files to process.
//!
//! Scans the top level of the input directory for files whose extension
//! matches the configured list (case-insensitive). Subdirectories are not
//! searched.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Finds video files eligible for processing in the specified directory.
///
/// Returns the matching paths sorted by name, or `CoreError::NoFilesFound`
/// if nothing matches.
pub fn find_processable_files(
    input_dir: &Path,
    extensions: &[String],
) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();

            if !path.is_file() {
                return None;
            }

            let ext = path.extension().and_then(|ext| ext.to_str())?;
            extensions
                .iter()
                .any(|wanted| ext.eq_ignore_ascii_case(wanted))
                .then_some(path)
        })
        .collect();

    if files.is_empty() {
        return Err(CoreError::NoFilesFound);
    }

    files.sort();
    Ok(files)
}
