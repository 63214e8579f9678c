//! Packed fixed-length bit vectors.
//!
//! A [`BitVector`] stores a perceptual hash as 64-bit words so that the
//! Hamming distance between two hashes is a run of XOR + popcount
//! instructions. On disk it is written as a plain list of booleans, which
//! keeps the cache schema `{path: string, hash: list<bool>}`.

use serde::{Deserialize, Serialize};

const WORD_BITS: usize = 64;

/// A fixed-length vector of bits, packed into `u64` words.
///
/// Bits past `len` in the last word are always zero, so word-wise
/// comparisons and popcounts never see garbage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<bool>", into = "Vec<bool>")]
pub struct BitVector {
    len: usize,
    words: Vec<u64>,
}

impl BitVector {
    /// Create a vector of `len` cleared bits.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            len,
            words: vec![0; words_for(len)],
        }
    }

    /// Build a vector from a slice of booleans.
    #[must_use]
    pub fn from_bools(bits: &[bool]) -> Self {
        bits.iter().copied().collect()
    }

    /// Number of bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the vector holds no bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "bit index {index} out of range {}", self.len);
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Set bit `index` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&mut self, index: usize, value: bool) {
        assert!(index < self.len, "bit index {index} out of range {}", self.len);
        let mask = 1u64 << (index % WORD_BITS);
        if value {
            self.words[index / WORD_BITS] |= mask;
        } else {
            self.words[index / WORD_BITS] &= !mask;
        }
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// The packed words, least significant bit first.
    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Hamming distance to `other`, or `None` if the lengths differ.
    #[must_use]
    pub fn distance(&self, other: &Self) -> Option<u32> {
        if self.len != other.len {
            return None;
        }
        Some(hamming(&self.words, &other.words))
    }

    /// Unpack into one boolean per bit.
    #[must_use]
    pub fn to_bools(&self) -> Vec<bool> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}

/// Hamming distance between two equally long word slices.
#[inline]
pub(crate) fn hamming(a: &[u64], b: &[u64]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Number of `u64` words needed to hold `bits` bits.
#[inline]
pub(crate) fn words_for(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut words = Vec::new();
        let mut len = 0;
        for bit in iter {
            if len % WORD_BITS == 0 {
                words.push(0);
            }
            if bit {
                if let Some(last) = words.last_mut() {
                    *last |= 1 << (len % WORD_BITS);
                }
            }
            len += 1;
        }
        Self { len, words }
    }
}

impl From<Vec<bool>> for BitVector {
    fn from(bits: Vec<bool>) -> Self {
        Self::from_bools(&bits)
    }
}

impl From<BitVector> for Vec<bool> {
    fn from(bits: BitVector) -> Self {
        bits.to_bools()
    }
}
