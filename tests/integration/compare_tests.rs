use super::fixtures::duplicate_set;
use dataforge::cache::CacheStore;
use dataforge::comparer::{Comparer, ComparerError, FileType};
use dataforge::dedup::DedupConfig;
use dataforge::hashing::HashMethod;
use dataforge::progress::ProgressCallback;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Default)]
struct Recorder {
    phases: Mutex<Vec<String>>,
    ticks: AtomicUsize,
}

impl ProgressCallback for Recorder {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        self.phases.lock().unwrap().push(format!("start:{phase}"));
    }

    fn on_progress(&self, _current: usize, _path: &str) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }

    fn on_phase_end(&self, phase: &str) {
        self.phases.lock().unwrap().push(format!("end:{phase}"));
    }
}

fn config() -> DedupConfig {
    DedupConfig::new()
        .with_core_size(8)
        .unwrap()
        .with_threshold(10)
        .unwrap()
}

#[test]
fn test_registry_names() {
    assert_eq!(FileType::ALL, &[FileType::Image]);
    assert_eq!(HashMethod::ALL, &[HashMethod::Dhash]);
    assert_eq!("dhash".parse::<HashMethod>().unwrap(), HashMethod::Dhash);
}

#[test]
fn test_unknown_names_list_alternatives() {
    let dir = tempdir().unwrap();

    let err = Comparer::new("image", "phash", config(), CacheStore::new(dir.path())).unwrap_err();
    assert!(matches!(err, ComparerError::UnknownMethod(ref m) if m == "phash"));
    assert!(err.to_string().contains("dhash"));

    let err = Comparer::new("audio", "dhash", config(), CacheStore::new(dir.path())).unwrap_err();
    assert!(matches!(err, ComparerError::UnsupportedFileType(_)));
    assert!(err.to_string().contains("image"));
}

#[test]
fn test_compare_reports_duplicates_and_progress() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let recorder = Arc::new(Recorder::default());

    let comparer = Comparer::new("image", "dhash", config(), CacheStore::new(cache.path()))
        .unwrap()
        .with_progress_callback(recorder.clone());

    assert_eq!(comparer.compare(&[a, b.clone(), c]).unwrap(), vec![b]);
    assert_eq!(recorder.ticks.load(Ordering::SeqCst), 3);
    assert_eq!(
        *recorder.phases.lock().unwrap(),
        vec!["start:hashing".to_string(), "end:hashing".to_string()]
    );
}

#[test]
fn test_compare_empty_input() {
    let cache = tempdir().unwrap();
    let comparer = Comparer::new("image", "dhash", config(), CacheStore::new(cache.path())).unwrap();

    assert!(comparer.compare(&[]).unwrap().is_empty());
    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[test]
fn test_custom_cache_name_is_shared() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());

    let comparer = Comparer::new("image", "dhash", config(), CacheStore::new(cache.path()))
        .unwrap()
        .with_cache_name(Some("dataset".to_string()));
    comparer.compare(&[a, b, c]).unwrap();

    let names: Vec<String> = std::fs::read_dir(cache.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["dataset__method_dhash_core_size_8.json".to_string()]);
}
