//! Perceptual hashing of images.
//!
//! A perceptual hash is a fixed-length bit vector summarising the coarse
//! structure of an image: visually similar images produce vectors that are
//! close in Hamming distance. These are similarity fingerprints, not
//! integrity checksums.
//!
//! # Architecture
//!
//! * [`bits`]: [`BitVector`], the packed representation every algorithm returns.
//! * [`dhash`]: [`DHash`], the gradient-based difference hash.
//! * [`fingerprints`]: [`Fingerprints`], an insertion-ordered path -> hash map.
//!
//! Algorithms implement [`HashAlgorithm`] and are looked up by name through
//! [`HashMethod`].

pub mod bits;
pub mod dhash;
pub mod fingerprints;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub use bits::BitVector;
pub use dhash::DHash;
pub use fingerprints::Fingerprints;

/// A perceptual hash function: image file + grid size -> bit vector.
///
/// Implementations must be pure functions of their two inputs. They are
/// shared across the hashing worker pool, so no interior state is allowed.
pub trait HashAlgorithm: Send + Sync {
    /// Stable name, used in cache filenames and logs.
    fn name(&self) -> &'static str;

    /// Hash the image at `path` on a `core_size` grid.
    ///
    /// Returns a vector of `core_size²` bits, or `None` if the file cannot
    /// be decoded as an image.
    fn compute_hash(&self, path: &Path, core_size: u32) -> Option<BitVector>;
}

/// Registered hashing methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashMethod {
    /// dHash (Difference Hash) - horizontal brightness gradients.
    #[default]
    Dhash,
}

impl HashMethod {
    /// Every method that has an implementation.
    pub const ALL: &'static [HashMethod] = &[HashMethod::Dhash];

    /// Lowercase name of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dhash => "dhash",
        }
    }

    /// Instantiate the algorithm behind this method.
    #[must_use]
    pub fn algorithm(&self) -> Arc<dyn HashAlgorithm> {
        match self {
            Self::Dhash => Arc::new(DHash),
        }
    }

    /// Comma-separated list of method names, for error messages.
    #[must_use]
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(HashMethod::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for HashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| format!("unknown hash method '{s}' (available: {})", Self::available()))
    }
}
