//! Command-line interface definitions for dataforge.
//!
//! Global options (verbosity, config file, log file) apply to every
//! subcommand. Values given here override the layered configuration.
//!
//! # Example
//!
//! ```bash
//! # Report near-duplicate JPEGs, ask before removing them
//! dataforge dedup ./photos
//!
//! # Looser tolerance, several patterns, remove without asking
//! dataforge dedup ./photos -p .jpg -p .png --threshold 15 --remove
//!
//! # Watch a drop folder, checking every 30 seconds
//! dataforge dedup ./incoming --repeat --sleep 30 --trash -y
//!
//! # Write the effective configuration to a file
//! dataforge init-config ./dataforge.toml
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Dataset curation toolkit: near-duplicate image removal.
#[derive(Debug, Parser)]
#[command(name = "dataforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (TOML) to load instead of the default location
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Write log output to this file instead of stderr
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Print errors as JSON objects
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find near-duplicate images in a directory and optionally remove them
    Dedup(DedupArgs),
    /// Write the effective configuration as TOML
    InitConfig(InitConfigArgs),
}

/// Arguments for the dedup subcommand.
///
/// Numeric tuning options are taken as text and validated when the
/// deduplication config is built, so the error names the offending field.
#[derive(Debug, Args, Default)]
pub struct DedupArgs {
    /// Directory holding the files to compare
    #[arg(value_name = "SRC")]
    pub src: PathBuf,

    /// Keep files whose name contains this text (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Vec<String>,

    /// Tolerance as a percentage of the hash length (0-100)
    #[arg(long, value_name = "PERCENT")]
    pub threshold: Option<String>,

    /// Side length of the resize grid; the hash has core_size² bits
    #[arg(long, value_name = "N")]
    pub core_size: Option<String>,

    /// Requested number of hashing workers (clamped to the CPU count)
    #[arg(long, value_name = "N")]
    pub n_jobs: Option<String>,

    /// Hashing method
    #[arg(short, long, value_name = "METHOD")]
    pub method: Option<String>,

    /// Kind of files being compared
    #[arg(long, value_name = "TYPE")]
    pub filetype: Option<String>,

    /// Directory holding hash cache files
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Fixed cache file name instead of one derived from SRC
    #[arg(long, value_name = "NAME")]
    pub cache_name: Option<String>,

    /// Remove duplicates without asking for confirmation
    #[arg(long, visible_short_alias = 'y', visible_alias = "yes")]
    pub remove: bool,

    /// Move duplicates to the system trash instead of unlinking them
    #[arg(long)]
    pub trash: bool,

    /// Keep running, rechecking SRC after each sleep
    #[arg(short, long)]
    pub repeat: bool,

    /// Seconds to wait between rounds in repeat mode
    #[arg(short, long, value_name = "SECS")]
    pub sleep: Option<u64>,
}

/// Arguments for the init-config subcommand.
#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Destination file (defaults to the platform config location)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
