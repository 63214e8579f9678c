use super::fixtures::{duplicate_set, write_gradient};
use clap::Parser;
use dataforge::actions::CONFIRM_PROMPT;
use dataforge::cli::Cli;
use dataforge::config::Settings;
use dataforge::error::ExitCode;
use dataforge::operation::DedupOperation;
use dataforge::signal::ShutdownHandler;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn settings(cache_dir: &Path) -> Settings {
    Settings {
        core_size: 8,
        n_jobs: 1,
        pattern: vec![".png".to_string()],
        cache_dir: cache_dir.to_path_buf(),
        ..Settings::default()
    }
}

fn operation(src: &Path, settings: Settings) -> DedupOperation {
    let config = settings.dedup_config(None).unwrap();
    DedupOperation::new(src, settings, config, None).unwrap()
}

#[test]
fn test_confirmed_round_removes_duplicates() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let op = operation(images.path(), settings(cache.path()));

    let mut output = Vec::new();
    let outcome = op.run_once(Cursor::new("delete\n"), &mut output).unwrap();

    assert_eq!(outcome.files, 3);
    assert_eq!(outcome.duplicates, vec![b.clone()]);
    let removal = outcome.removal.as_ref().unwrap();
    assert_eq!(removal.success_count(), 1);
    assert!(removal.all_succeeded());
    assert_eq!(outcome.exit_code(), ExitCode::Success);

    let printed = String::from_utf8(output).unwrap();
    assert!(printed.contains(&b.display().to_string()));
    assert!(printed.contains(CONFIRM_PROMPT));

    assert!(a.exists());
    assert!(!b.exists());
    assert!(c.exists());
}

#[test]
fn test_refused_round_keeps_files() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (_, b, _) = duplicate_set(images.path());
    let op = operation(images.path(), settings(cache.path()));

    let outcome = op.run_once(Cursor::new("no\n"), Vec::new()).unwrap();
    assert_eq!(outcome.duplicates, vec![b.clone()]);
    assert!(outcome.removal.is_none());
    assert!(b.exists());
}

#[test]
fn test_custom_confirm_choice_is_case_insensitive() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (_, b, _) = duplicate_set(images.path());
    let mut settings = settings(cache.path());
    settings.confirm_choice = vec!["yes".to_string(), "delete".to_string()];
    let op = operation(images.path(), settings);

    op.run_once(Cursor::new("  YES \n"), Vec::new()).unwrap();
    assert!(!b.exists());
}

#[test]
fn test_remove_flag_skips_prompt() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (_, b, _) = duplicate_set(images.path());
    let mut settings = settings(cache.path());
    settings.remove = true;
    let op = operation(images.path(), settings);

    let mut output = Vec::new();
    let outcome = op.run_once(Cursor::new(""), &mut output).unwrap();
    assert_eq!(outcome.removal.unwrap().success_count(), 1);
    assert!(!String::from_utf8(output).unwrap().contains(CONFIRM_PROMPT));
    assert!(!b.exists());
}

#[test]
fn test_pattern_filters_files() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    duplicate_set(images.path());
    let mut settings = settings(cache.path());
    settings.pattern = vec!["c.".to_string()];
    let op = operation(images.path(), settings);

    let outcome = op.run_once(Cursor::new(""), Vec::new()).unwrap();
    assert_eq!(outcome.files, 1);
    assert!(outcome.duplicates.is_empty());
}

#[test]
fn test_run_exit_codes() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    write_gradient(images.path(), "a.png", true);
    write_gradient(images.path(), "c.png", false);
    let shutdown = ShutdownHandler::new();

    let op = operation(images.path(), settings(cache.path()));
    let code = op.run(&shutdown, Cursor::new(""), Vec::new()).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);

    fs::copy(images.path().join("a.png"), images.path().join("b.png")).unwrap();
    let code = op.run(&shutdown, Cursor::new("no\n"), Vec::new()).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_missing_source_is_an_error() {
    let cache = tempdir().unwrap();
    let op = operation(&cache.path().join("absent"), settings(cache.path()));
    assert!(op.run_once(Cursor::new(""), Vec::new()).is_err());
}

#[test]
fn test_repeat_stops_on_shutdown() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let mut settings = settings(cache.path());
    settings.repeat = true;
    settings.sleep = 60;
    let op = operation(images.path(), settings);

    let shutdown = ShutdownHandler::new();
    shutdown.request_shutdown();
    let code = op.run(&shutdown, Cursor::new(""), Vec::new()).unwrap();
    assert_eq!(code, ExitCode::Interrupted);
}

#[test]
fn test_repeat_processes_new_files_between_rounds() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let mut settings = settings(cache.path());
    settings.repeat = true;
    settings.remove = true;
    settings.sleep = 1;
    let op = operation(images.path(), settings);

    let shutdown = ShutdownHandler::new();
    let flag = shutdown.get_flag();
    let dir = images.path().to_path_buf();
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        duplicate_set(&dir);
        thread::sleep(Duration::from_millis(2500));
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    let code = op.run(&shutdown, Cursor::new(""), Vec::new()).unwrap();
    writer.join().unwrap();

    assert_eq!(code, ExitCode::Interrupted);
    assert!(images.path().join("a.png").exists());
    assert!(!images.path().join("b.png").exists());
    assert!(images.path().join("c.png").exists());
}

#[test]
fn test_run_app_init_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dataforge.toml");
    let target = path.to_string_lossy().to_string();

    let cli = Cli::parse_from(["dataforge", "-q", "init-config", target.as_str()]);
    assert_eq!(dataforge::run_app(cli).unwrap(), ExitCode::Success);
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("method = \"dhash\""));

    let cli = Cli::parse_from(["dataforge", "-q", "init-config", target.as_str()]);
    assert!(dataforge::run_app(cli).is_err());

    let cli = Cli::parse_from(["dataforge", "-q", "init-config", "--force", target.as_str()]);
    assert!(dataforge::run_app(cli).is_ok());
}

#[test]
fn test_run_app_dedup_with_remove() {
    let images = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let (a, b, c) = duplicate_set(images.path());
    let config = cache.path().join("empty.toml");
    fs::write(&config, "").unwrap();

    let cli = Cli::parse_from([
        "dataforge".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        config.to_string_lossy().to_string(),
        "dedup".to_string(),
        images.path().to_string_lossy().to_string(),
        "-p".to_string(),
        ".png".to_string(),
        "--core-size".to_string(),
        "8".to_string(),
        "--cache-dir".to_string(),
        cache.path().to_string_lossy().to_string(),
        "--remove".to_string(),
    ]);

    assert_eq!(dataforge::run_app(cli).unwrap(), ExitCode::Success);
    assert!(a.exists());
    assert!(!b.exists());
    assert!(c.exists());
}
