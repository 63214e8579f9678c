use super::fixtures::duplicate_set;
use dataforge::cache::{CacheStore, HashTable};
use dataforge::comparer::{Comparer, ComparerError};
use dataforge::dedup::{DedupConfig, DedupError};
use dataforge::hashing::BitVector;
use std::fs;
use tempfile::tempdir;

fn comparer(cache_dir: &std::path::Path) -> Comparer {
    let config = DedupConfig::new()
        .with_core_size(8)
        .unwrap()
        .with_threshold(10)
        .unwrap();
    Comparer::new("image", "dhash", config, CacheStore::new(cache_dir)).unwrap()
}

#[test]
fn test_garbage_cache_is_rebuilt() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let comparer = comparer(cache.path());

    let cache_file = comparer.engine().cache_file_for(images.path());
    fs::write(&cache_file, b"{ this is not json").unwrap();

    let duplicates = comparer.compare(&[a, b.clone(), c]).unwrap();
    assert_eq!(duplicates, vec![b]);

    let rebuilt = CacheStore::new(cache.path()).load(&cache_file);
    assert_eq!(rebuilt.len(), 3);
    assert!(rebuilt.hash.iter().all(|h| h.len() == 64));
}

#[test]
fn test_truncated_cache_is_rebuilt() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let comparer = comparer(cache.path());
    let paths = vec![a, b, c];

    comparer.compare(&paths).unwrap();
    let cache_file = comparer.engine().cache_file_for(images.path());
    let content = fs::read(&cache_file).unwrap();
    fs::write(&cache_file, &content[..content.len() / 2]).unwrap();

    assert_eq!(comparer.compare(&paths).unwrap().len(), 1);
    assert_eq!(CacheStore::new(cache.path()).load(&cache_file).len(), 3);
}

#[test]
fn test_mixed_hash_lengths_are_rejected() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let comparer = comparer(cache.path());

    // A cache written for this directory and core size, holding a 16-bit
    // hash for a.png. The other two images are hashed fresh at 64 bits.
    let mut table = HashTable::new();
    table.push(&a, BitVector::zeros(16));
    let cache_file = comparer.engine().cache_file_for(images.path());
    assert!(CacheStore::new(cache.path()).save(table, &cache_file));

    let err = comparer.compare(&[a, b, c]).unwrap_err();
    match err {
        ComparerError::Dedup(DedupError::InconsistentHashLength {
            expected, found, ..
        }) => {
            assert_eq!(expected, 16);
            assert_eq!(found, 64);
        }
        other => panic!("unexpected error: {other}"),
    }
}
