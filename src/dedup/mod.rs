//! Near-duplicate image detection.
//!
//! * [`config`]: [`DedupConfig`], the validated grid size, tolerance and worker count.
//! * [`engine`]: [`DedupEngine`], cache reconciliation, parallel hashing and the
//!   duplicate search.
//! * [`matrix`]: [`HashMatrix`], hashes stacked for Hamming distance sweeps.

pub mod config;
pub mod engine;
pub mod matrix;

pub use config::{clamp_jobs, ConfigError, CoreSize, DedupConfig, Numeric, DEFAULT_CORE_SIZE};
pub use engine::{DedupEngine, DedupError, HashStats, HashTask};
pub use matrix::HashMatrix;
