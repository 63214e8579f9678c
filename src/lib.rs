//! dataforge - dataset curation toolkit.
//!
//! Finds near-duplicate images with perceptual hashing (dHash), keeps an
//! incremental per-directory hash cache, and removes duplicates after
//! confirmation.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod comparer;
pub mod config;
pub mod dedup;
pub mod error;
pub mod hashing;
pub mod logging;
pub mod operation;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, DedupArgs, InitConfigArgs};
use crate::config::Settings;
use crate::error::ExitCode;
use crate::logging::{init_logging, LoggingError};
use crate::operation::DedupOperation;
use crate::progress::{Progress, ProgressCallback};

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unreadable source
/// directory, or any other failure that stops the command.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    match init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        Ok(()) => {}
        Err(LoggingError::AlreadyInitialized(_)) => {
            log::debug!("Logger already initialized, keeping it");
        }
        Err(e) => return Err(e.into()),
    }

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Dedup(args) => run_dedup(settings, &args, cli.quiet),
        Commands::InitConfig(args) => run_init_config(&settings, &args),
    }
}

fn run_dedup(mut settings: Settings, args: &DedupArgs, quiet: bool) -> Result<ExitCode> {
    log::info!("Started dedup with parameters: {:?}", args);
    settings.apply_dedup_args(args);
    let config = settings
        .dedup_config(Some(args))
        .context("Invalid deduplication settings")?;

    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(quiet));
    let operation = DedupOperation::new(&args.src, settings, config, Some(progress))?;
    let shutdown = signal::install_handler()?;

    operation.run(&shutdown, io::stdin().lock(), io::stdout())
}

fn run_init_config(settings: &Settings, args: &InitConfigArgs) -> Result<ExitCode> {
    let path = match args.path {
        Some(ref path) => path.clone(),
        None => Settings::default_path()
            .context("Failed to determine the platform configuration directory")?,
    };

    anyhow::ensure!(
        args.force || !path.exists(),
        "{} already exists (use --force to overwrite)",
        path.display()
    );

    settings.save(&path)?;
    println!("{}", path.display());
    Ok(ExitCode::Success)
}
