use dataforge::cache::{CacheStore, HashTable};
use dataforge::hashing::{BitVector, Fingerprints};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn sample(len: usize) -> Fingerprints {
    (0..5)
        .map(|i| {
            let bits: Vec<bool> = (0..len).map(|b| (b + i) % 3 == 0).collect();
            (PathBuf::from(format!("/data/img_{i}.jpg")), BitVector::from(bits))
        })
        .collect()
}

#[test]
fn test_round_trip_preserves_rows_and_order() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let file = store.path_for("round_trip.json");
    let map = sample(256);

    assert!(store.save(&map, &file));
    let loaded = Fingerprints::from(store.load(&file));

    assert_eq!(loaded.len(), 5);
    let expected: Vec<&Path> = map.paths().collect();
    let actual: Vec<&Path> = loaded.paths().collect();
    assert_eq!(actual, expected);
    for (path, hash) in map.iter() {
        assert_eq!(loaded.get(path), Some(hash));
    }
}

#[test]
fn test_file_is_columnar_envelope() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let file = store.path_for("schema.json");

    let mut table = HashTable::new();
    table.push(Path::new("/data/a.jpg"), BitVector::from_bools(&[true, false, true]));
    store.save(table, &file);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(raw["version"], 1);
    assert!(raw["checksum"].as_str().unwrap().len() == 64);
    assert!(raw["created_at"].is_string());
    assert_eq!(raw["table"]["path"][0], "/data/a.jpg");
    assert_eq!(raw["table"]["hash"][0], serde_json::json!([true, false, true]));
}

#[test]
fn test_overwrite_replaces_previous_table() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let file = store.path_for("overwrite.json");

    store.save(&sample(64), &file);
    let mut smaller = Fingerprints::new();
    smaller.insert(PathBuf::from("/data/only.jpg"), BitVector::zeros(64));
    store.save(&smaller, &file);

    let loaded = store.load(&file);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.path, vec!["/data/only.jpg"]);
}

#[test]
fn test_generated_names_are_idempotent_across_spellings() {
    let dir = tempdir().unwrap();
    let photos = dir.path().join("photos");
    std::fs::create_dir(&photos).unwrap();
    let dotted = photos.join(".");
    let params: &[(&str, &dyn Display)] = &[("method", &"dhash"), ("core_size", &16)];

    let plain = CacheStore::generate_filename(&photos, None, params);
    let via_dot = CacheStore::generate_filename(&dotted, None, params);
    assert_eq!(plain, CacheStore::generate_filename(&photos, None, params));
    assert!(plain.starts_with("cache_"));
    assert!(plain.ends_with("_photos_method_dhash_core_size_16.json"));
    assert_eq!(plain, via_dot);
}
