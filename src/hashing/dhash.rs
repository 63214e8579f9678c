//! Difference hash (dHash).
//!
//! The image is decoded as grayscale, shrunk to `(core_size + 1) x core_size`
//! with area averaging, and every row contributes one bit per pair of
//! adjacent columns: set when the left pixel is brighter than the right one.
//! The resulting `core_size x core_size` matrix is flattened row-major.

use std::path::Path;

use image::{GrayImage, ImageReader};

use super::{BitVector, HashAlgorithm};

/// Gradient-based perceptual hash.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DHash;

impl DHash {
    /// Hash an already decoded grayscale image.
    ///
    /// Returns `None` for an empty image or a zero `core_size`.
    #[must_use]
    pub fn hash_luma(image: &GrayImage, core_size: u32) -> Option<BitVector> {
        if core_size == 0 || image.width() == 0 || image.height() == 0 {
            return None;
        }

        let width = core_size as usize + 1;
        let height = core_size as usize;
        let pixels = area_resize(image, width, height);

        let bits = (0..height).flat_map(|row| {
            let line = &pixels[row * width..(row + 1) * width];
            line.windows(2).map(|pair| pair[0] > pair[1])
        });
        Some(bits.collect())
    }
}

impl HashAlgorithm for DHash {
    fn name(&self) -> &'static str {
        "dhash"
    }

    fn compute_hash(&self, path: &Path, core_size: u32) -> Option<BitVector> {
        let decoded = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.decode());

        match decoded {
            Ok(img) => Self::hash_luma(&img.to_luma8(), core_size),
            Err(e) => {
                log::debug!("Cannot decode {} as an image: {}", path.display(), e);
                None
            }
        }
    }
}

/// Resize a grayscale image by averaging the source area under each
/// destination pixel.
///
/// Every destination pixel covers a `src/dst` sized box of the source;
/// partially covered source pixels contribute in proportion to the overlap.
/// The filter is separable, so rows and columns are averaged in two passes.
fn area_resize(image: &GrayImage, dst_width: usize, dst_height: usize) -> Vec<u8> {
    let src_width = image.width() as usize;
    let src_height = image.height() as usize;
    let x_weights = area_weights(src_width, dst_width);
    let y_weights = area_weights(src_height, dst_height);
    let raw = image.as_raw();

    // Horizontal pass: src_height rows of dst_width columns.
    let mut horizontal = vec![0f64; src_height * dst_width];
    for y in 0..src_height {
        let row = &raw[y * src_width..(y + 1) * src_width];
        for (x, taps) in x_weights.iter().enumerate() {
            horizontal[y * dst_width + x] =
                taps.iter().map(|&(sx, w)| f64::from(row[sx]) * w).sum();
        }
    }

    // Vertical pass.
    let mut out = Vec::with_capacity(dst_width * dst_height);
    for taps in &y_weights {
        for x in 0..dst_width {
            let value: f64 = taps
                .iter()
                .map(|&(sy, w)| horizontal[sy * dst_width + x] * w)
                .sum();
            out.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

/// For every destination index, the source indices it overlaps and their
/// normalised weights (each list sums to 1).
fn area_weights(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f64)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * scale;
            let end = start + scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 0.0).then_some((s, overlap / scale))
                })
                .collect()
        })
        .collect()
}
