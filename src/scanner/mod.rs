//! Scanner module for discovering the files an operation works on.
//!
//! # Architecture
//!
//! - [`collector`]: non-recursive listing of a source directory filtered by
//!   file-name patterns
//!
//! # Example
//!
//! ```no_run
//! use dataforge::scanner::collect_files;
//! use std::path::Path;
//!
//! let patterns = vec![".jpg".to_string(), ".png".to_string()];
//! let files = collect_files(Path::new("./photos"), &patterns).unwrap();
//! println!("Found {} files", files.len());
//! ```

pub mod collector;

use std::path::PathBuf;

pub use collector::{collect_files, matches_any};

/// Errors that can occur while collecting files.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while reading the directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
