//! Dense matrix of packed hashes for distance sweeps.

use std::path::PathBuf;

use crate::hashing::bits::{hamming, words_for};
use crate::hashing::Fingerprints;

use super::DedupError;

/// All hashes of a [`Fingerprints`] map stacked row by row into one
/// contiguous buffer of `u64` words.
#[derive(Debug, Clone)]
pub struct HashMatrix {
    rows: usize,
    bits: usize,
    stride: usize,
    data: Vec<u64>,
}

impl HashMatrix {
    /// Stack the hashes of `map` in iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::InconsistentHashLength`] if any hash differs in
    /// length from the first one.
    pub fn from_fingerprints(map: &Fingerprints) -> Result<Self, DedupError> {
        let bits = map.hashes().next().map_or(0, |h| h.len());
        let stride = words_for(bits);
        let mut data = Vec::with_capacity(map.len() * stride);

        for (path, hash) in map.iter() {
            if hash.len() != bits {
                return Err(DedupError::InconsistentHashLength {
                    path: PathBuf::from(path),
                    expected: bits,
                    found: hash.len(),
                });
            }
            data.extend_from_slice(hash.words());
        }

        Ok(Self {
            rows: map.len(),
            bits,
            stride,
            data,
        })
    }

    /// Number of rows (images).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Hash length in bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Packed words of row `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[u64] {
        &self.data[index * self.stride..(index + 1) * self.stride]
    }

    /// Hamming distance from row `index` to every row, itself included.
    #[must_use]
    pub fn distances_from(&self, index: usize) -> Vec<u32> {
        let origin = self.row(index);
        if self.stride == 0 {
            return vec![0; self.rows];
        }
        self.data
            .chunks_exact(self.stride)
            .map(|row| hamming(origin, row))
            .collect()
    }
}
