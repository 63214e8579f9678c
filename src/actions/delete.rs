//! Removal of duplicate files.
//!
//! # Overview
//!
//! Duplicates are unlinked by default. With [`DeleteConfig::trash`] they are
//! moved to the system trash instead and can be restored.
//!
//! A file that is already gone when its turn comes is logged as a warning and
//! skipped; it does not count as a failure.
//!
//! # Example
//!
//! ```no_run
//! use dataforge::actions::delete::{delete_batch, DeleteConfig};
//! use std::path::PathBuf;
//!
//! let duplicates = vec![PathBuf::from("/photos/copy_of_a.jpg")];
//! let result = delete_batch(&duplicates, &DeleteConfig::default(), None);
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::progress::ProgressCallback;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// File that could not be trashed
        path: PathBuf,
        /// Message from the trash backend
        message: String,
    },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed {
        /// File that could not be removed
        path: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// File being inspected
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// Result of a successful deletion operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

/// Results of a batch deletion operation.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Files that no longer existed.
    pub skipped: Vec<PathBuf>,
    /// Failed deletions with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Removed {} file(s), freed {} bytes",
            self.success_count(),
            self.bytes_freed
        );
        if !self.skipped.is_empty() {
            summary.push_str(&format!(", {} already gone", self.skipped.len()));
        }
        if !self.all_succeeded() {
            summary.push_str(&format!(", {} failed", self.failure_count()));
        }
        summary
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfig {
    /// Unlink files instead of moving them to the trash.
    pub permanent: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self { permanent: true }
    }
}

impl DeleteConfig {
    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self { permanent: false }
    }

    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self::default()
    }
}

fn file_size(path: &Path) -> Result<u64, DeleteError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DeleteError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied(path.to_path_buf()),
            _ => DeleteError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = file_size(path)?;

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: false,
    })
}

/// Permanently delete a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `PermanentDeleteFailed` if the delete operation fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = file_size(path)?;

    fs::remove_file(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            return DeleteError::NotFound(path.to_path_buf());
        }
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("{} removed ({} bytes)", path.display(), size);
    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: true,
    })
}

/// Delete every path in `paths`.
///
/// Missing files are recorded in `skipped`. Other failures are recorded and
/// do not stop the batch.
#[must_use]
pub fn delete_batch(
    paths: &[PathBuf],
    config: &DeleteConfig,
    progress: Option<&dyn ProgressCallback>,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();

    if let Some(cb) = progress {
        cb.on_phase_start("removing", paths.len());
    }

    for (index, path) in paths.iter().enumerate() {
        if let Some(cb) = progress {
            cb.on_progress(index + 1, path.to_string_lossy().as_ref());
        }

        let outcome = if config.permanent {
            permanent_delete(path)
        } else {
            delete_to_trash(path)
        };

        match outcome {
            Ok(deleted) => {
                result.bytes_freed += deleted.size;
                result.successes.push(deleted);
            }
            Err(DeleteError::NotFound(missing)) => {
                log::warn!("{} file not exists, skipping", missing.display());
                result.skipped.push(missing);
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", path.display(), e);
                result.failures.push((path.clone(), e.to_string()));
            }
        }
    }

    if let Some(cb) = progress {
        cb.on_phase_end("removing");
    }
    log::info!("{}", result.summary());
    result
}
