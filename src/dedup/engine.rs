//! Cache reconciliation, parallel hashing and duplicate search.
//!
//! # Hashing pipeline
//!
//! 1. Derive the cache filename from the source directory and parameters
//! 2. Load the cached table (missing or corrupted files give an empty one)
//! 3. Reconcile against the requested paths: drop obsolete entries, hash
//!    only the missing ones
//! 4. Persist the merged map unless the cache already matched 1:1; an empty
//!    map removes the cache file instead
//!
//! # Duplicate search
//!
//! Rows are visited in map order. Each row not yet marked is a survivor and
//! marks every later row within `threshold_bits` of it.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::cache::{CacheStore, HashTable};
use crate::hashing::{BitVector, Fingerprints, HashAlgorithm};
use crate::progress::ProgressCallback;

use super::config::{ConfigError, DedupConfig};
use super::matrix::HashMatrix;

/// Errors surfaced by the deduplication engine.
#[derive(Debug, Error)]
pub enum DedupError {
    /// Hashes of different lengths cannot be compared.
    #[error(
        "inconsistent hash length for {path}: expected {expected} bits, found {found} \
         (was the cache built with a different core size?)"
    )]
    InconsistentHashLength {
        /// Path of the first mismatching hash
        path: PathBuf,
        /// Length of the first hash in the map
        expected: usize,
        /// Length of the mismatching hash
        found: usize,
    },

    /// Invalid configuration value.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Counters describing how a hash map was assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashStats {
    /// Entries reused from the cache
    pub cached: usize,
    /// Cache entries dropped because their path was not requested
    pub obsolete: usize,
    /// Hashes computed in this call
    pub computed: usize,
    /// Paths that could not be decoded as images
    pub unreadable: usize,
    /// Requested paths that cannot be stored in the cache (not valid UTF-8)
    pub uncacheable: usize,
    /// True if the cache matched the requested paths exactly
    pub cache_hit: bool,
}

/// One unit of work for the hashing pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashTask {
    /// Image to hash
    pub path: PathBuf,
    /// Grid size to hash at
    pub core_size: u32,
}

impl HashTask {
    /// Run the task with `algorithm`.
    #[must_use]
    pub fn run(&self, algorithm: &dyn HashAlgorithm) -> Option<BitVector> {
        algorithm.compute_hash(&self.path, self.core_size)
    }
}

/// Perceptual-hash deduplication engine.
pub struct DedupEngine {
    algorithm: Arc<dyn HashAlgorithm>,
    config: DedupConfig,
    store: CacheStore,
    cache_name: Option<String>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for DedupEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupEngine")
            .field("algorithm", &self.algorithm.name())
            .field("config", &self.config)
            .field("store", &self.store)
            .field("cache_name", &self.cache_name)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl DedupEngine {
    /// Create an engine hashing with `algorithm` and caching into `store`.
    #[must_use]
    pub fn new(algorithm: Arc<dyn HashAlgorithm>, config: DedupConfig, store: CacheStore) -> Self {
        Self {
            algorithm,
            config,
            store,
            cache_name: None,
            progress: None,
        }
    }

    /// Use a fixed cache name instead of one derived from the directory.
    #[must_use]
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = Some(name.into());
        self
    }

    /// Report hashing progress to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut DedupConfig {
        &mut self.config
    }

    /// Name of the hashing algorithm.
    #[must_use]
    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Cache file used for images in `source_dir` under the current parameters.
    #[must_use]
    pub fn cache_file_for(&self, source_dir: &Path) -> PathBuf {
        let method = self.algorithm.name();
        let core_size = self.config.core_size();
        let filename = CacheStore::generate_filename(
            source_dir,
            self.cache_name.as_deref(),
            &[("method", &method), ("core_size", &core_size)],
        );
        self.store.path_for(&filename)
    }

    /// Hash every path, reusing the on-disk cache where possible.
    ///
    /// The result is ordered like `paths` (made absolute, repeats dropped)
    /// and omits files that could not be decoded.
    #[must_use]
    pub fn get_hashmap(&self, paths: &[PathBuf]) -> Fingerprints {
        self.get_hashmap_with_stats(paths).0
    }

    /// Like [`Self::get_hashmap`], also reporting how the map was assembled.
    #[must_use]
    pub fn get_hashmap_with_stats(&self, paths: &[PathBuf]) -> (Fingerprints, HashStats) {
        let paths = absolute_unique(paths);
        let Some(first) = paths.first() else {
            return (Fingerprints::new(), HashStats::default());
        };

        let source_dir = first.parent().unwrap_or_else(|| Path::new("."));
        let cache_file = self.cache_file_for(source_dir);
        let cached = Fingerprints::from(self.store.load(&cache_file));

        let (merged, stats) = if cached.is_empty() {
            let mut stats = HashStats {
                uncacheable: paths.iter().filter(|p| p.to_str().is_none()).count(),
                ..HashStats::default()
            };
            let merged = self.hash_into(Fingerprints::new(), &paths, &mut stats);
            (merged, stats)
        } else {
            self.reconcile(cached, &paths)
        };

        if !stats.cache_hit {
            let table = HashTable::from(&merged);
            if table.is_empty() {
                self.store.remove(&cache_file);
            } else {
                self.store.save(table, &cache_file);
            }
        }

        (order_like(merged, &paths), stats)
    }

    fn reconcile(&self, mut cached: Fingerprints, paths: &[PathBuf]) -> (Fingerprints, HashStats) {
        let wanted: HashSet<&Path> = paths.iter().map(PathBuf::as_path).collect();
        let (mut missing, uncacheable): (Vec<PathBuf>, Vec<PathBuf>) = paths
            .iter()
            .filter(|p| !cached.contains_key(p))
            .cloned()
            .partition(|p| p.to_str().is_some());

        let before = cached.len();
        cached.retain(|path, _| wanted.contains(path));

        let mut stats = HashStats {
            cached: cached.len(),
            obsolete: before - cached.len(),
            uncacheable: uncacheable.len(),
            ..HashStats::default()
        };

        if missing.is_empty() && stats.obsolete == 0 {
            log::info!("Cache matches all {} files, nothing to hash", stats.cached);
            stats.cache_hit = true;
            let merged = self.hash_into(cached, &uncacheable, &mut stats);
            return (merged, stats);
        }

        log::info!(
            "Cache reconciled: {} kept, {} obsolete, {} missing",
            stats.cached,
            stats.obsolete,
            missing.len() + uncacheable.len()
        );
        missing.extend(uncacheable);
        let merged = self.hash_into(cached, &missing, &mut stats);
        (merged, stats)
    }

    fn hash_into(
        &self,
        mut map: Fingerprints,
        paths: &[PathBuf],
        stats: &mut HashStats,
    ) -> Fingerprints {
        if paths.is_empty() {
            return map;
        }
        for (path, hash) in self.compute_hashes(paths) {
            match hash {
                Some(hash) => {
                    map.insert(path, hash);
                    stats.computed += 1;
                }
                None => stats.unreadable += 1,
            }
        }
        log::info!(
            "Hashed {} images ({} unreadable)",
            stats.computed,
            stats.unreadable
        );
        map
    }

    /// Hash `paths` on the worker pool.
    ///
    /// Blocks until the whole batch is done. Results follow the order of
    /// `paths`; `None` marks a file that could not be decoded.
    #[must_use]
    pub fn compute_hashes(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Option<BitVector>)> {
        let core_size = self.config.core_size();
        let tasks: Vec<HashTask> = paths
            .iter()
            .map(|path| HashTask {
                path: path.clone(),
                core_size,
            })
            .collect();

        if let Some(ref callback) = self.progress {
            callback.on_phase_start("hashing", tasks.len());
        }
        log::debug!(
            "Hashing {} files with {} worker(s)",
            tasks.len(),
            self.config.n_jobs()
        );

        let done = AtomicUsize::new(0);
        let algorithm = self.algorithm.as_ref();
        let progress = self.progress.as_deref();
        let run = || -> Vec<(PathBuf, Option<BitVector>)> {
            tasks
                .into_par_iter()
                .map(|task| {
                    let hash = task.run(algorithm);
                    if hash.is_none() {
                        log::debug!("Skipping unreadable image {}", task.path.display());
                    }
                    if let Some(callback) = progress {
                        let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                        callback.on_progress(current, task.path.to_string_lossy().as_ref());
                    }
                    (task.path, hash)
                })
                .collect()
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.n_jobs())
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log::warn!(
                    "Failed to create hashing pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                run()
            }
        };

        if let Some(ref callback) = self.progress {
            callback.on_phase_end("hashing");
        }
        results
    }

    /// Paths of every image that lies within `threshold_bits` of an earlier
    /// surviving image in `map`.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::InconsistentHashLength`] if the hashes differ
    /// in length.
    pub fn find_duplicates(&self, map: &Fingerprints) -> Result<Vec<PathBuf>, DedupError> {
        if map.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = HashMatrix::from_fingerprints(map)?;
        let threshold = self.config.threshold_bits();
        let paths: Vec<&Path> = map.paths().collect();
        let mut marked = vec![false; matrix.rows()];

        for i in 0..matrix.rows() {
            if marked[i] {
                continue;
            }
            let distances = matrix.distances_from(i);
            for j in (i + 1)..matrix.rows() {
                if distances[j] <= threshold {
                    log::debug!(
                        "{} duplicates {} (distance {})",
                        paths[j].display(),
                        paths[i].display(),
                        distances[j]
                    );
                    marked[j] = true;
                }
            }
        }

        let duplicates: Vec<PathBuf> = paths
            .iter()
            .zip(&marked)
            .filter(|(_, &is_dup)| is_dup)
            .map(|(path, _)| path.to_path_buf())
            .collect();
        log::info!(
            "Found {} duplicates among {} images (threshold {} bits)",
            duplicates.len(),
            matrix.rows(),
            threshold
        );
        Ok(duplicates)
    }
}

fn absolute_unique(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .map(|p| std::path::absolute(p).unwrap_or_else(|_| p.clone()))
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

fn order_like(mut map: Fingerprints, paths: &[PathBuf]) -> Fingerprints {
    let mut ordered = Fingerprints::new();
    for path in paths {
        if let Some(hash) = map.get(path) {
            ordered.insert(path.clone(), hash.clone());
        }
    }
    map.retain(|path, _| !ordered.contains_key(path));
    ordered.extend(map);
    ordered
}
