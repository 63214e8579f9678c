//! Reading and writing hash cache files.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::table::{HashTable, CACHE_FORMAT_VERSION};

/// Longest directory-name fragment kept in generated cache filenames.
const DIR_NAME_MAX_CHARS: usize = 30;

/// Reasons a cache file is considered corrupted.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The file could not be read or written.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Cache file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid cache envelope.
    #[error("Failed to parse cache file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The stored checksum does not match the table.
    #[error("Cache integrity check failed: checksum mismatch")]
    ChecksumMismatch,

    /// The file was written by an incompatible format version.
    #[error("Unsupported cache version: {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this build writes
        expected: u32,
    },

    /// The path and hash columns have different lengths.
    #[error("Cache columns differ in length: {paths} paths, {hashes} hashes")]
    ColumnMismatch {
        /// Rows in the path column
        paths: usize,
        /// Rows in the hash column
        hashes: usize,
    },
}

/// On-disk layout of a cache file.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    version: u32,
    created_at: DateTime<Utc>,
    /// SHA256 of the compact JSON serialization of `table`.
    checksum: String,
    table: HashTable,
}

fn table_checksum(table: &HashTable) -> Result<String, CacheError> {
    let json = serde_json::to_string(table)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Durable store of hash tables under a cache directory.
///
/// Loading never fails: a missing file is a cold cache, a corrupted one is
/// deleted and also treated as cold. Saving logs failures instead of
/// returning them.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Extension of every cache file.
    pub const SUFFIX: &'static str = ".json";

    /// Create a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of a cache file inside the cache directory.
    #[must_use]
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Deterministic cache filename for a source directory and parameters.
    ///
    /// Without a custom name the result is
    /// `cache_<md5(absolute dir)>_<dir name><suffix>`; with one it is
    /// `<sanitized name>_<suffix>`. The suffix is `_key_value` for each
    /// parameter, in order, followed by [`Self::SUFFIX`].
    ///
    /// # Example
    ///
    /// ```
    /// use dataforge::cache::CacheStore;
    /// use std::path::Path;
    ///
    /// let name = CacheStore::generate_filename(Path::new("/data"), Some("my cache"), &[("core_size", &16)]);
    /// assert_eq!(name, "my_cache__core_size_16.json");
    /// ```
    #[must_use]
    pub fn generate_filename(
        source_dir: &Path,
        custom_name: Option<&str>,
        params: &[(&str, &dyn Display)],
    ) -> String {
        let param_suffix: String = params
            .iter()
            .map(|(key, value)| format!("_{key}_{value}"))
            .collect();
        let full_suffix = format!("{param_suffix}{}", Self::SUFFIX);

        match custom_name {
            None => {
                let absolute = fs::canonicalize(source_dir)
                    .or_else(|_| std::path::absolute(source_dir))
                    .unwrap_or_else(|_| source_dir.to_path_buf());
                let digest = md5::compute(absolute.to_string_lossy().as_bytes());
                let folder: String = source_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().replace(' ', "_"))
                    .unwrap_or_default()
                    .trim_matches('.')
                    .chars()
                    .take(DIR_NAME_MAX_CHARS)
                    .collect();
                format!("cache_{digest:x}_{folder}{full_suffix}")
            }
            Some(name) => {
                let name = name.replace(' ', "_");
                let name = name.trim_matches('.');
                let name = name.strip_suffix(Self::SUFFIX).unwrap_or(name);
                format!("{name}_{full_suffix}")
            }
        }
    }

    /// Load the table stored in `file`.
    ///
    /// Returns an empty table if the file is missing or corrupted; a
    /// corrupted file is deleted so the next save rebuilds it.
    #[must_use]
    pub fn load(&self, file: &Path) -> HashTable {
        if !file.exists() {
            log::warn!("Cache file {} does not exist", file.display());
            return HashTable::new();
        }

        log::info!("Loading cache file {}", file.display());
        match read_table(file) {
            Ok(table) => {
                log::debug!("Loaded {} cached hashes", table.len());
                table
            }
            Err(e) => {
                log::error!("Cache file {} is corrupted: {}. Deleting.", file.display(), e);
                if let Err(rm) = fs::remove_file(file) {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("Failed to delete cache file {}: {}", file.display(), rm);
                    }
                }
                HashTable::new()
            }
        }
    }

    /// Write `data` to `file`, creating parent directories.
    ///
    /// Accepts a [`HashTable`] or anything convertible into one (such as
    /// [`crate::hashing::Fingerprints`]). Empty input is skipped. Returns
    /// whether the file was written; failures are logged.
    pub fn save<T: Into<HashTable>>(&self, data: T, file: &Path) -> bool {
        let table = data.into();
        if table.is_empty() {
            log::warn!("No hashes to save, skipping cache write to {}", file.display());
            return false;
        }

        log::info!("Saving {} hashes to {}", table.len(), file.display());
        match write_table(table, file) {
            Ok(()) => {
                log::info!("Cache saved successfully to {}", file.display());
                true
            }
            Err(e) => {
                log::error!("Failed to save cache {}: {}", file.display(), e);
                false
            }
        }
    }

    /// Delete `file` if it exists. Returns whether a file was removed.
    pub fn remove(&self, file: &Path) -> bool {
        match fs::remove_file(file) {
            Ok(()) => {
                log::info!("Removed cache file {}", file.display());
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                log::warn!("Failed to delete cache file {}: {}", file.display(), e);
                false
            }
        }
    }
}

fn read_table(file: &Path) -> Result<HashTable, CacheError> {
    let content = fs::read(file).map_err(|source| CacheError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let envelope: CacheEnvelope = serde_json::from_slice(&content)?;

    if envelope.version != CACHE_FORMAT_VERSION {
        return Err(CacheError::UnsupportedVersion {
            found: envelope.version,
            expected: CACHE_FORMAT_VERSION,
        });
    }
    if table_checksum(&envelope.table)? != envelope.checksum {
        return Err(CacheError::ChecksumMismatch);
    }
    if !envelope.table.is_consistent() {
        return Err(CacheError::ColumnMismatch {
            paths: envelope.table.path.len(),
            hashes: envelope.table.hash.len(),
        });
    }
    Ok(envelope.table)
}

fn write_table(table: HashTable, file: &Path) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: file.to_path_buf(),
        source,
    };

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let envelope = CacheEnvelope {
        version: CACHE_FORMAT_VERSION,
        created_at: Utc::now(),
        checksum: table_checksum(&table)?,
        table,
    };

    let mut writer = BufWriter::new(File::create(file).map_err(io_err)?);
    serde_json::to_writer(&mut writer, &envelope)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}
