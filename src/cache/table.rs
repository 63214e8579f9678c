//! Columnar hash table stored in cache files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hashing::{BitVector, Fingerprints};

/// Current version of the cache file format.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Hash records in columnar layout: `{path: [string], hash: [[bool]]}`.
///
/// Row `i` is `(path[i], hash[i])`. Paths are absolute and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashTable {
    /// Absolute image paths.
    pub path: Vec<String>,
    /// Perceptual hash of the image on the same row.
    pub hash: Vec<BitVector>,
}

impl HashTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Append a row.
    ///
    /// Paths that are not valid UTF-8 cannot be stored as a JSON string
    /// without loss, so they are skipped and `false` is returned.
    pub fn push(&mut self, path: &Path, hash: BitVector) -> bool {
        let Some(text) = path.to_str() else {
            log::warn!(
                "Not caching {}: path is not valid UTF-8",
                path.display()
            );
            return false;
        };
        self.path.push(text.to_owned());
        self.hash.push(hash);
        true
    }

    /// Iterate over `(path, hash)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &BitVector)> {
        self.path.iter().map(String::as_str).zip(&self.hash)
    }

    /// Returns true if both columns have the same number of rows.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.path.len() == self.hash.len()
    }
}

impl From<&Fingerprints> for HashTable {
    fn from(map: &Fingerprints) -> Self {
        let mut table = Self::new();
        for (path, hash) in map.iter() {
            table.push(path, hash.clone());
        }
        table
    }
}

impl From<Fingerprints> for HashTable {
    fn from(map: Fingerprints) -> Self {
        let mut table = Self::new();
        for (path, hash) in map {
            table.push(&path, hash);
        }
        table
    }
}

impl From<HashTable> for Fingerprints {
    fn from(table: HashTable) -> Self {
        table
            .path
            .into_iter()
            .map(PathBuf::from)
            .zip(table.hash)
            .collect()
    }
}
