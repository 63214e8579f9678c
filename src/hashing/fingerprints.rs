//! Insertion-ordered map from image path to perceptual hash.
//!
//! Duplicate search keeps the lowest-index image of every matching group,
//! so the order in which hashes were inserted is part of the result. A plain
//! `HashMap` would lose it, hence this small ordered map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::BitVector;

/// Path -> hash map that iterates in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprints {
    entries: Vec<(PathBuf, BitVector)>,
    index: HashMap<PathBuf, usize>,
}

impl Fingerprints {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a hash. Replacing an existing path keeps its position.
    pub fn insert(&mut self, path: PathBuf, hash: BitVector) -> Option<BitVector> {
        if let Some(&i) = self.index.get(&path) {
            return Some(std::mem::replace(&mut self.entries[i].1, hash));
        }
        self.index.insert(path.clone(), self.entries.len());
        self.entries.push((path, hash));
        None
    }

    /// Look up the hash for `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&BitVector> {
        self.index.get(path).map(|&i| &self.entries[i].1)
    }

    /// Returns true if `path` has a hash.
    #[must_use]
    pub fn contains_key(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain<F: FnMut(&Path, &BitVector) -> bool>(&mut self, mut keep: F) {
        self.entries.retain(|(p, h)| keep(p, h));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (p, _))| (p.clone(), i))
            .collect();
    }

    /// Iterate over `(path, hash)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &BitVector)> {
        self.entries.iter().map(|(p, h)| (p.as_path(), h))
    }

    /// Iterate over the paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(p, _)| p.as_path())
    }

    /// Iterate over the hashes in insertion order.
    pub fn hashes(&self) -> impl Iterator<Item = &BitVector> {
        self.entries.iter().map(|(_, h)| h)
    }
}

impl FromIterator<(PathBuf, BitVector)> for Fingerprints {
    fn from_iter<I: IntoIterator<Item = (PathBuf, BitVector)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl Extend<(PathBuf, BitVector)> for Fingerprints {
    fn extend<I: IntoIterator<Item = (PathBuf, BitVector)>>(&mut self, iter: I) {
        for (path, hash) in iter {
            self.insert(path, hash);
        }
    }
}

impl IntoIterator for Fingerprints {
    type Item = (PathBuf, BitVector);
    type IntoIter = std::vec::IntoIter<(PathBuf, BitVector)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
