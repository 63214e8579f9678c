//! Comparer selection by file type and hashing method.
//!
//! A [`Comparer`] wraps one [`DedupEngine`] and exposes a single
//! [`Comparer::compare`] entry point returning the paths to remove.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::cache::CacheStore;
use crate::dedup::{ConfigError, DedupConfig, DedupEngine, DedupError};
use crate::hashing::HashMethod;
use crate::progress::ProgressCallback;

/// Errors raised while building or running a comparer.
#[derive(Debug, Error)]
pub enum ComparerError {
    /// No algorithm is registered under this name.
    #[error("unknown method '{0}' (available: {methods})", methods = HashMethod::available())]
    UnknownMethod(String),

    /// No comparer exists for this file type.
    #[error("unsupported file type '{0}' (available: {types})", types = FileType::available())]
    UnsupportedFileType(String),

    /// Invalid configuration value.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The duplicate search failed.
    #[error(transparent)]
    Dedup(#[from] DedupError),
}

/// Kinds of files a comparer can deduplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    /// Raster images decodable by the `image` crate.
    #[default]
    Image,
}

impl FileType {
    /// Every supported file type.
    pub const ALL: &'static [FileType] = &[FileType::Image];

    /// Lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
        }
    }

    /// Comma-separated list of supported names.
    #[must_use]
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(FileType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ComparerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ComparerError::UnsupportedFileType(s.to_string()))
    }
}

/// Finds near-duplicate files with the configured algorithm.
#[derive(Debug)]
pub struct Comparer {
    filetype: FileType,
    method: HashMethod,
    engine: DedupEngine,
}

impl Comparer {
    /// Build a comparer for `filetype` files hashed with `method`.
    ///
    /// # Errors
    ///
    /// Returns [`ComparerError::UnsupportedFileType`] or
    /// [`ComparerError::UnknownMethod`] for unregistered names.
    pub fn new(
        filetype: &str,
        method: &str,
        config: DedupConfig,
        store: CacheStore,
    ) -> Result<Self, ComparerError> {
        let filetype: FileType = filetype.parse()?;
        let method: HashMethod = method
            .parse()
            .map_err(|_| ComparerError::UnknownMethod(method.to_string()))?;

        log::debug!(
            "Using {} comparer with {} (core size {}, threshold {} bits, {} worker(s))",
            filetype,
            method,
            config.core_size(),
            config.threshold_bits(),
            config.n_jobs()
        );

        let engine = match filetype {
            FileType::Image => DedupEngine::new(method.algorithm(), config, store),
        };
        Ok(Self {
            filetype,
            method,
            engine,
        })
    }

    /// Use a fixed cache name for every directory.
    #[must_use]
    pub fn with_cache_name(mut self, name: Option<String>) -> Self {
        if let Some(name) = name {
            self.engine = self.engine.with_cache_name(name);
        }
        self
    }

    /// Report hashing progress to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.engine = self.engine.with_progress_callback(callback);
        self
    }

    /// File type this comparer handles.
    #[must_use]
    pub fn filetype(&self) -> FileType {
        self.filetype
    }

    /// Hashing method in use.
    #[must_use]
    pub fn method(&self) -> HashMethod {
        self.method
    }

    /// The underlying engine.
    #[must_use]
    pub fn engine(&self) -> &DedupEngine {
        &self.engine
    }

    /// Hash `paths` and return the ones that duplicate an earlier file.
    ///
    /// # Errors
    ///
    /// Returns [`ComparerError::Dedup`] if the cached and fresh hashes
    /// cannot be compared.
    pub fn compare(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, ComparerError> {
        let map = self.engine.get_hashmap(paths);
        Ok(self.engine.find_duplicates(&map)?)
    }
}
