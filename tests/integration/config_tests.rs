use dataforge::cli::DedupArgs;
use dataforge::config::Settings;
use dataforge::dedup::ConfigError;
use figment::providers::Env;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_toml_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
core_size = 8
hash_threshold = 5.5
pattern = [".png", ".jpeg"]
cache_name = "shared"
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(path.as_path())).unwrap();
    assert_eq!(settings.core_size, 8);
    assert_eq!(settings.hash_threshold, 5.5);
    assert_eq!(settings.pattern, vec![".png", ".jpeg"]);
    assert_eq!(settings.cache_name.as_deref(), Some("shared"));
    assert_eq!(settings.method, "dhash");
    assert_eq!(settings.confirm_choice, vec!["delete"]);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = Settings::load(Some(missing.as_path())).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_wrong_type_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "core_size = \"large\"\n").unwrap();

    let err = Settings::load(Some(path.as_path())).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load configuration"));
}

#[test]
fn test_environment_layer_wins_over_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "n_jobs = 2\nsleep = 30\n").unwrap();

    std::env::set_var("DFTEST_LAYER_N_JOBS", "7");
    std::env::set_var("DFTEST_LAYER_SLEEP", "3");
    let settings: Settings = Settings::figment(Some(path.as_path()))
        .merge(Env::prefixed("DFTEST_LAYER_"))
        .extract()
        .unwrap();
    std::env::remove_var("DFTEST_LAYER_N_JOBS");
    std::env::remove_var("DFTEST_LAYER_SLEEP");

    assert_eq!(settings.n_jobs, 7);
    assert_eq!(settings.sleep, 3);
}

#[test]
fn test_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut settings = Settings::default();
    settings.core_size = 12;
    settings.trash = true;
    settings.cache_dir = PathBuf::from("/var/cache/dataforge");
    settings.save(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("core_size = 12"));
    assert!(!text.contains("cache_name"));

    assert_eq!(Settings::load(Some(path.as_path())).unwrap(), settings);
}

#[test]
fn test_flags_override_settings() {
    let mut settings = Settings::default();
    let args = DedupArgs {
        src: PathBuf::from("photos"),
        core_size: Some("8".into()),
        threshold: Some("10".into()),
        n_jobs: Some("1".into()),
        ..Default::default()
    };

    settings.apply_dedup_args(&args);
    let config = settings.dedup_config(Some(&args)).unwrap();
    assert_eq!(config.core_size(), 8);
    assert_eq!(config.threshold_bits(), 6);
    assert_eq!(config.n_jobs(), 1);

    let defaults = Settings::default().dedup_config(None).unwrap();
    assert_eq!(defaults.core_size(), 16);
    assert_eq!(defaults.threshold_bits(), 25);
}

#[test]
fn test_invalid_flag_values() {
    let settings = Settings::default();

    let args = DedupArgs {
        threshold: Some("lots".into()),
        ..Default::default()
    };
    assert!(matches!(
        settings.dedup_config(Some(&args)),
        Err(ConfigError::NotNumeric { field: "threshold", .. })
    ));

    let args = DedupArgs {
        threshold: Some("150".into()),
        ..Default::default()
    };
    assert!(matches!(
        settings.dedup_config(Some(&args)),
        Err(ConfigError::ThresholdOutOfRange(_))
    ));

    let args = DedupArgs {
        core_size: Some("0".into()),
        ..Default::default()
    };
    assert!(matches!(
        settings.dedup_config(Some(&args)),
        Err(ConfigError::InvalidCoreSize(_))
    ));
}
