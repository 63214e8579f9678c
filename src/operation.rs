//! The `dedup` operation: collect files, find duplicates, remove on consent.
//!
//! One round lists the source directory, runs the comparer, reports what it
//! found and removes the duplicates if the user agreed. In repeat mode
//! rounds continue until Ctrl+C, sleeping between them.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::actions::{confirm_removal, delete_batch, BatchDeleteResult, DeleteConfig};
use crate::cache::CacheStore;
use crate::comparer::Comparer;
use crate::config::Settings;
use crate::dedup::DedupConfig;
use crate::error::ExitCode;
use crate::progress::ProgressCallback;
use crate::scanner::collect_files;
use crate::signal::ShutdownHandler;

/// What a single round did.
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    /// Files compared
    pub files: usize,
    /// Duplicates found
    pub duplicates: Vec<PathBuf>,
    /// Removal result, if removal was confirmed
    pub removal: Option<BatchDeleteResult>,
}

impl RoundOutcome {
    /// Exit code summarising this round.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self.removal {
            _ if self.duplicates.is_empty() => ExitCode::NoDuplicates,
            Some(ref removal) if !removal.all_succeeded() => ExitCode::PartialSuccess,
            _ => ExitCode::Success,
        }
    }
}

/// Near-duplicate removal over one source directory.
pub struct DedupOperation {
    src: PathBuf,
    settings: Settings,
    comparer: Comparer,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for DedupOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupOperation")
            .field("src", &self.src)
            .field("settings", &self.settings)
            .field("comparer", &self.comparer)
            .finish_non_exhaustive()
    }
}

impl DedupOperation {
    /// Build the operation for `src`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file type or method in `settings` is not
    /// registered.
    pub fn new(
        src: impl Into<PathBuf>,
        settings: Settings,
        config: DedupConfig,
        progress: Option<Arc<dyn ProgressCallback>>,
    ) -> Result<Self> {
        let store = CacheStore::new(&settings.cache_dir);
        let mut comparer = Comparer::new(&settings.filetype, &settings.method, config, store)?
            .with_cache_name(settings.cache_name.clone());
        if let Some(ref callback) = progress {
            comparer = comparer.with_progress_callback(Arc::clone(callback));
        }

        Ok(Self {
            src: src.into(),
            settings,
            comparer,
            progress,
        })
    }

    /// Run one round, prompting on `input`/`output` if removal needs consent.
    ///
    /// # Errors
    ///
    /// Returns an error if the source directory cannot be listed, the
    /// hashes cannot be compared, or the prompt fails.
    pub fn run_once<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<RoundOutcome> {
        let files = collect_files(&self.src, &self.settings.pattern)?;
        self.process(files, input, &mut output)
    }

    fn process<R: BufRead, W: Write>(
        &self,
        files: Vec<PathBuf>,
        input: R,
        output: &mut W,
    ) -> Result<RoundOutcome> {
        let duplicates = self.comparer.compare(&files)?;
        log::info!(
            "Found {} duplicates in {} files",
            duplicates.len(),
            files.len()
        );

        let mut outcome = RoundOutcome {
            files: files.len(),
            duplicates,
            removal: None,
        };
        if outcome.duplicates.is_empty() {
            return Ok(outcome);
        }

        for path in &outcome.duplicates {
            writeln!(output, "{}", path.display()).context("Failed to write duplicate list")?;
        }

        let confirmed = confirm_removal(
            self.settings.remove,
            input,
            &mut *output,
            &self.settings.confirm_choice,
        )
        .context("Failed to read confirmation")?;

        if confirmed {
            let config = if self.settings.trash {
                DeleteConfig::trash()
            } else {
                DeleteConfig::permanent()
            };
            outcome.removal = Some(delete_batch(
                &outcome.duplicates,
                &config,
                self.progress.as_deref(),
            ));
        }
        Ok(outcome)
    }

    /// Run until done: once, or in repeat mode until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns the first error of any round.
    pub fn run<R: BufRead, W: Write>(
        &self,
        shutdown: &ShutdownHandler,
        mut input: R,
        mut output: W,
    ) -> Result<ExitCode> {
        let pause = Duration::from_secs(self.settings.sleep);
        let mut last = ExitCode::NoDuplicates;

        loop {
            if shutdown.is_shutdown_requested() {
                log::info!("Ctrl+C pressed, stopping...");
                return Ok(ExitCode::Interrupted);
            }

            let files = collect_files(&self.src, &self.settings.pattern)?;
            if files.is_empty() && self.settings.repeat {
                log::info!(
                    "No files found for task {:?}. Wait for {} seconds...",
                    self.settings.pattern,
                    self.settings.sleep
                );
            } else {
                last = self.process(files, &mut input, &mut output)?.exit_code();
            }

            if !self.settings.repeat {
                log::info!("Finished");
                return Ok(last);
            }
            if !shutdown.sleep(pause) {
                log::info!("Ctrl+C pressed, stopping...");
                return Ok(ExitCode::Interrupted);
            }
        }
    }
}
