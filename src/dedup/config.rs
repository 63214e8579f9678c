//! Validated deduplication parameters.
//!
//! [`DedupConfig`] holds the grid size, the user-facing tolerance and the
//! worker count. Every setter validates its input and then calls
//! [`DedupConfig::recompute`] so the derived `threshold_bits` never goes
//! stale.

use std::fmt;

use thiserror::Error;

/// Default resize grid side length.
pub const DEFAULT_CORE_SIZE: u32 = 16;

/// Errors raised when assigning configuration values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The value could not be interpreted as a number.
    #[error("{field} must be numeric, got '{value}'")]
    NotNumeric {
        /// Name of the field being set
        field: &'static str,
        /// Offending input
        value: String,
    },

    /// The tolerance percentage is outside `[0, 100]`.
    #[error("threshold must be between 0 and 100 percent, got {0}")]
    ThresholdOutOfRange(f64),

    /// The grid size is not a positive integer.
    #[error("core size must be a positive integer, got {0}")]
    InvalidCoreSize(String),
}

/// A loosely typed numeric input, as it arrives from config files or the
/// command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    /// Integer input.
    Int(i64),
    /// Floating point input; truncated where an integer is needed.
    Float(f64),
    /// Text that should parse as a number.
    Text(String),
}

impl Numeric {
    fn as_f64(&self, field: &'static str) -> Result<f64, ConfigError> {
        let value = match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().map_err(|_| self.not_numeric(field))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.not_numeric(field))
        }
    }

    fn as_i64(&self, field: &'static str) -> Result<i64, ConfigError> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Text(s) => match s.trim().parse::<i64>() {
                Ok(v) => Ok(v),
                Err(_) => Ok(self.as_f64(field)?.trunc() as i64),
            },
            Self::Float(_) => Ok(self.as_f64(field)?.trunc() as i64),
        }
    }

    fn not_numeric(&self, field: &'static str) -> ConfigError {
        ConfigError::NotNumeric {
            field,
            value: self.to_string(),
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! numeric_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Numeric {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

numeric_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Numeric {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f32> for Numeric {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Numeric {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Numeric {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Grid size input: a single number or a `(primary, fallback)` pair.
///
/// For a pair the first element is used when positive, otherwise the second.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreSize {
    /// A single value.
    Value(Numeric),
    /// A `(primary, fallback)` pair.
    Pair(i64, i64),
}

macro_rules! core_size_from {
    ($($t:ty),*) => {
        $(impl From<$t> for CoreSize {
            fn from(v: $t) -> Self {
                Self::Value(Numeric::from(v))
            }
        })*
    };
}

core_size_from!(i8, i16, i32, i64, u8, u16, u32, usize, f32, f64, &str, String);

impl From<Numeric> for CoreSize {
    fn from(v: Numeric) -> Self {
        Self::Value(v)
    }
}

impl From<(i64, i64)> for CoreSize {
    fn from((a, b): (i64, i64)) -> Self {
        Self::Pair(a, b)
    }
}

impl From<(i32, i32)> for CoreSize {
    fn from((a, b): (i32, i32)) -> Self {
        Self::Pair(i64::from(a), i64::from(b))
    }
}

/// Clamp a requested worker count against the number of CPU cores.
///
/// Requests of one or less give 1. On a multi-core machine a request that
/// would use every core is reduced to `cores - 1`; a single-core machine
/// always gets 1.
#[must_use]
pub fn clamp_jobs(requested: i64, cores: usize) -> usize {
    if requested <= 1 || cores <= 1 {
        return 1;
    }
    let requested = usize::try_from(requested).unwrap_or(usize::MAX);
    if requested >= cores {
        cores - 1
    } else {
        requested
    }
}

/// Deduplication parameters with a derived bit tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupConfig {
    core_size: u32,
    threshold_percent: Option<f64>,
    threshold_bits: u32,
    n_jobs: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            core_size: DEFAULT_CORE_SIZE,
            threshold_percent: None,
            threshold_bits: 0,
            n_jobs: 1,
        }
    }
}

impl DedupConfig {
    /// Create a config with the default grid size, no tolerance and one worker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Side length of the resize grid.
    #[must_use]
    pub fn core_size(&self) -> u32 {
        self.core_size
    }

    /// Last tolerance percentage that was set, if any.
    #[must_use]
    pub fn threshold_percent(&self) -> Option<f64> {
        self.threshold_percent
    }

    /// Largest Hamming distance still counted as a duplicate.
    #[must_use]
    pub fn threshold_bits(&self) -> u32 {
        self.threshold_bits
    }

    /// Number of hashing workers.
    #[must_use]
    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    /// Length of every hash produced under this config.
    #[must_use]
    pub fn hash_len(&self) -> usize {
        let side = self.core_size as usize;
        side * side
    }

    /// Set the grid size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the input is not numeric or not positive.
    pub fn set_core_size(&mut self, value: impl Into<CoreSize>) -> Result<(), ConfigError> {
        let size = match value.into() {
            CoreSize::Value(n) => n.as_i64("core_size")?,
            CoreSize::Pair(first, second) => {
                if first > 0 {
                    first
                } else {
                    second
                }
            }
        };
        self.core_size = u32::try_from(size)
            .ok()
            .filter(|&s| s > 0)
            .ok_or_else(|| ConfigError::InvalidCoreSize(size.to_string()))?;
        self.recompute();
        Ok(())
    }

    /// Set the tolerance as a percentage of the hash length.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the input is not numeric or outside `[0, 100]`.
    pub fn set_threshold(&mut self, value: impl Into<Numeric>) -> Result<(), ConfigError> {
        let percent = value.into().as_f64("threshold")?;
        if !(0.0..=100.0).contains(&percent) {
            return Err(ConfigError::ThresholdOutOfRange(percent));
        }
        self.threshold_percent = Some(percent);
        self.recompute();
        Ok(())
    }

    /// Set the requested worker count, clamped against the CPU count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotNumeric`] for non-numeric input.
    pub fn set_n_jobs(&mut self, value: impl Into<Numeric>) -> Result<(), ConfigError> {
        let requested = value.into().as_i64("n_jobs")?;
        self.n_jobs = clamp_jobs(requested, num_cpus::get());
        Ok(())
    }

    /// Builder form of [`Self::set_core_size`].
    ///
    /// # Errors
    ///
    /// See [`Self::set_core_size`].
    pub fn with_core_size(mut self, value: impl Into<CoreSize>) -> Result<Self, ConfigError> {
        self.set_core_size(value)?;
        Ok(self)
    }

    /// Builder form of [`Self::set_threshold`].
    ///
    /// # Errors
    ///
    /// See [`Self::set_threshold`].
    pub fn with_threshold(mut self, value: impl Into<Numeric>) -> Result<Self, ConfigError> {
        self.set_threshold(value)?;
        Ok(self)
    }

    /// Builder form of [`Self::set_n_jobs`].
    ///
    /// # Errors
    ///
    /// See [`Self::set_n_jobs`].
    pub fn with_n_jobs(mut self, value: impl Into<Numeric>) -> Result<Self, ConfigError> {
        self.set_n_jobs(value)?;
        Ok(self)
    }

    /// Recompute `threshold_bits` from the grid size and the last percentage.
    ///
    /// Does nothing until a percentage has been set.
    pub fn recompute(&mut self) {
        if let Some(percent) = self.threshold_percent {
            let bits = (self.hash_len() as f64 * percent / 100.0).floor();
            self.threshold_bits = bits as u32;
        }
    }
}
