//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, else `<config dir>/config.toml`)
//! 3. Environment variables prefixed with `DATAFORGE_`
//! 4. Command-line flags, applied by [`Settings::apply_dedup_args`]

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::DedupArgs;
use crate::dedup::{ConfigError, DedupConfig};

/// Prefix of environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "DATAFORGE_";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "dataforge", "dataforge")
}

/// Default directory for hash cache files.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("cache"))
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hashing method name.
    pub method: String,
    /// Kind of files to compare.
    pub filetype: String,
    /// Side length of the resize grid.
    pub core_size: u32,
    /// Tolerance as a percentage of the hash length.
    pub hash_threshold: f64,
    /// Requested worker count before clamping.
    pub n_jobs: i64,
    /// Directory holding hash cache files.
    pub cache_dir: PathBuf,
    /// Fixed cache file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_name: Option<String>,
    /// File-name patterns selecting the files to compare.
    pub pattern: Vec<String>,
    /// Answers accepted by the removal prompt.
    pub confirm_choice: Vec<String>,
    /// Remove duplicates without asking.
    pub remove: bool,
    /// Move duplicates to the trash instead of unlinking.
    pub trash: bool,
    /// Keep rerunning the operation.
    pub repeat: bool,
    /// Seconds between rounds in repeat mode.
    pub sleep: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            method: "dhash".to_string(),
            filetype: "image".to_string(),
            core_size: 16,
            hash_threshold: 10.0,
            n_jobs: 4,
            cache_dir: default_cache_dir(),
            cache_name: None,
            pattern: vec![".jpg".to_string()],
            confirm_choice: vec!["delete".to_string()],
            remove: false,
            trash: false,
            repeat: false,
            sleep: 60,
        }
    }
}

impl Settings {
    /// Default platform-specific configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Base figment: defaults merged with the TOML file at `path`.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Settings::default()));
        match path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        }
    }

    /// Load settings from every layer except the command line.
    ///
    /// An explicit `config_file` must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing or any layer holds
    /// values of the wrong type.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_file {
            anyhow::ensure!(
                path.is_file(),
                "Configuration file not found: {}",
                path.display()
            );
        }

        let file = config_file
            .map(Path::to_path_buf)
            .or_else(Self::default_path);
        let settings: Settings = Self::figment(file.as_deref())
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Failed to load configuration")?;

        log::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Write these settings as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Configuration written to {}", path.display());
        Ok(())
    }

    /// Override non-numeric settings with the flags given on the command line.
    ///
    /// Numeric tuning flags are applied by [`Self::dedup_config`].
    pub fn apply_dedup_args(&mut self, args: &DedupArgs) {
        if !args.pattern.is_empty() {
            self.pattern = args.pattern.clone();
        }
        if let Some(ref method) = args.method {
            self.method = method.clone();
        }
        if let Some(ref filetype) = args.filetype {
            self.filetype = filetype.clone();
        }
        if let Some(ref dir) = args.cache_dir {
            self.cache_dir = dir.clone();
        }
        if args.cache_name.is_some() {
            self.cache_name = args.cache_name.clone();
        }
        if let Some(sleep) = args.sleep {
            self.sleep = sleep;
        }
        self.remove |= args.remove;
        self.trash |= args.trash;
        self.repeat |= args.repeat;
    }

    /// Build the validated deduplication config from these settings, with
    /// the raw numeric flags of `args` taking precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a non-numeric or out-of-range value.
    pub fn dedup_config(&self, args: Option<&DedupArgs>) -> Result<DedupConfig, ConfigError> {
        let mut config = DedupConfig::new();

        match args.and_then(|a| a.core_size.as_deref()) {
            Some(raw) => config.set_core_size(raw)?,
            None => config.set_core_size(self.core_size)?,
        }
        match args.and_then(|a| a.threshold.as_deref()) {
            Some(raw) => config.set_threshold(raw)?,
            None => config.set_threshold(self.hash_threshold)?,
        }
        match args.and_then(|a| a.n_jobs.as_deref()) {
            Some(raw) => config.set_n_jobs(raw)?,
            None => config.set_n_jobs(self.n_jobs)?,
        }
        Ok(config)
    }
}
