use super::fixtures::{copy_as, duplicate_set, write_gradient};
use dataforge::cache::CacheStore;
use dataforge::dedup::{DedupConfig, DedupEngine};
use dataforge::hashing::{DHash, HashAlgorithm};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

fn engine(cache_dir: &std::path::Path, core_size: u32, threshold: f64) -> DedupEngine {
    let config = DedupConfig::new()
        .with_core_size(core_size)
        .unwrap()
        .with_threshold(threshold)
        .unwrap()
        .with_n_jobs(2)
        .unwrap();
    DedupEngine::new(Arc::new(DHash), config, CacheStore::new(cache_dir))
}

#[test]
fn test_end_to_end_keeps_first_copy() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let engine = engine(cache.path(), 8, 10.0);

    let map = engine.get_hashmap(&[a.clone(), b.clone(), c.clone()]);
    assert_eq!(map.len(), 3);
    assert!(map.hashes().all(|h| h.len() == 64));
    assert_eq!(map.get(&a), map.get(&b));
    assert_eq!(map.get(&a).unwrap().distance(map.get(&c).unwrap()), Some(64));

    assert_eq!(engine.find_duplicates(&map).unwrap(), vec![b]);
}

#[test]
fn test_survivor_follows_input_order() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let engine = engine(cache.path(), 8, 10.0);

    let map = engine.get_hashmap(&[b.clone(), c, a.clone()]);
    assert_eq!(engine.find_duplicates(&map).unwrap(), vec![a]);
}

#[test]
fn test_unreadable_files_are_skipped() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, _) = duplicate_set(images.path());
    let notes = images.path().join("notes.png");
    fs::write(&notes, "not an image").unwrap();
    let engine = engine(cache.path(), 8, 10.0);

    let (map, stats) = engine.get_hashmap_with_stats(&[a, b.clone(), notes.clone()]);
    assert_eq!(map.len(), 2);
    assert!(!map.contains_key(&notes));
    assert_eq!(stats.computed, 2);
    assert_eq!(stats.unreadable, 1);
    assert_eq!(engine.find_duplicates(&map).unwrap(), vec![b]);
}

#[test]
fn test_delta_after_files_change() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let engine = engine(cache.path(), 8, 10.0);

    let (_, first) = engine.get_hashmap_with_stats(&[a.clone(), b.clone(), c.clone()]);
    assert_eq!(first.computed, 3);
    assert!(!first.cache_hit);

    let (_, warm) = engine.get_hashmap_with_stats(&[a.clone(), b.clone(), c.clone()]);
    assert!(warm.cache_hit);
    assert_eq!(warm.computed, 0);
    assert_eq!(warm.cached, 3);

    fs::remove_file(&b).unwrap();
    let d = copy_as(&c, images.path(), "d.png");
    let (map, delta) = engine.get_hashmap_with_stats(&[a.clone(), c.clone(), d.clone()]);
    assert_eq!(delta.cached, 2);
    assert_eq!(delta.obsolete, 1);
    assert_eq!(delta.computed, 1);
    assert_eq!(engine.find_duplicates(&map).unwrap(), vec![d]);

    let stored = CacheStore::new(cache.path()).load(&engine.cache_file_for(images.path()));
    let stored_paths: Vec<PathBuf> = stored.path.iter().map(PathBuf::from).collect();
    assert_eq!(stored_paths.len(), 3);
    assert!(!stored_paths.contains(&b));
}

#[test]
fn test_core_size_changes_cache_file_and_hash_length() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let paths = [a, b, c];

    let small = engine(cache.path(), 8, 10.0);
    let large = engine(cache.path(), 16, 10.0);
    assert_ne!(
        small.cache_file_for(images.path()),
        large.cache_file_for(images.path())
    );

    let map = large.get_hashmap(&paths);
    assert!(map.hashes().all(|h| h.len() == 256));
    assert_eq!(large.config().threshold_bits(), 25);
    assert_eq!(large.find_duplicates(&map).unwrap().len(), 1);
    assert_eq!(small.get_hashmap(&paths).hashes().next().unwrap().len(), 64);
}

#[test]
fn test_near_duplicate_within_threshold() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let a = write_gradient(images.path(), "a.png", true);

    // Flatten the last column pair of every row so one bit per row flips.
    let mut edited = image::open(&a).unwrap().to_luma8();
    let (w, h) = edited.dimensions();
    for y in 0..h {
        for x in (w - 20)..w {
            edited.put_pixel(x, y, image::Luma([0]));
        }
    }
    let b = images.path().join("b.png");
    edited.save(&b).unwrap();

    let dhash = DHash;
    let ha = dhash.compute_hash(&a, 8).unwrap();
    let hb = dhash.compute_hash(&b, 8).unwrap();
    let distance = ha.distance(&hb).unwrap();
    assert!(distance > 0 && distance <= 8, "distance {distance}");

    let loose = engine(cache.path(), 8, 15.0);
    let strict = engine(cache.path(), 8, 0.0);
    let map = loose.get_hashmap(&[a.clone(), b.clone()]);
    assert_eq!(loose.find_duplicates(&map).unwrap(), vec![b]);
    assert!(strict.find_duplicates(&map).unwrap().is_empty());
}
