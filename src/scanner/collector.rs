//! Source directory listing.
//!
//! Only the top level of the source directory is read. A regular file is
//! kept when its file name contains any of the patterns, so `.jpg` matches
//! `photo.jpg` as well as `photo.jpg.bak`.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::ScanError;

/// Returns true if `name` contains at least one of `patterns`.
#[must_use]
pub fn matches_any(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| name.contains(p.as_str()))
}

/// List the regular files directly inside `src` whose names match `patterns`.
///
/// The result is sorted by path. Entries that cannot be read are logged and
/// skipped.
///
/// # Errors
///
/// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`] if `src`
/// cannot be listed, and [`ScanError::Io`] if the directory itself cannot be
/// opened.
pub fn collect_files(src: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, ScanError> {
    if !src.exists() {
        log::error!("Source path '{}' does not exist", src.display());
        return Err(ScanError::NotFound(src.to_path_buf()));
    }
    if !src.is_dir() {
        return Err(ScanError::NotADirectory(src.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(src)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if e.depth() == 0 {
                    let path = e.path().unwrap_or(src).to_path_buf();
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                    return Err(ScanError::Io { path, source });
                }
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if matches_any(&name, patterns) {
            log::trace!("Matched {}", entry.path().display());
            files.push(entry.into_path());
        }
    }

    files.sort();
    files.dedup();
    log::debug!("Total files for task: {}", files.len());
    Ok(files)
}
