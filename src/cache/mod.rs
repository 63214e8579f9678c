//! Hash caching module.
//!
//! Persists computed perceptual hashes so later runs over the same
//! directory only hash new files.
//!
//! # Architecture
//!
//! * [`table`]: [`HashTable`], the columnar `{path, hash}` record set.
//! * [`store`]: [`CacheStore`], filename generation plus self-healing load and save.
//!
//! # Cache Invalidation
//!
//! Entries are validated by path only. A cached path that is no longer part
//! of the current file list is dropped; a file edited in place keeps its old
//! hash until the cache file is removed.

pub mod store;
pub mod table;

pub use store::{CacheError, CacheStore};
pub use table::{HashTable, CACHE_FORMAT_VERSION};
