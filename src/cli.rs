//! Command-line interface definitions for logotext.
//!
//! # Example
//!
//! ```bash
//! # Extract text from every image in two folders
//! logotext extract ./logos ./marks
//!
//! # Higher-recall extraction for one image, as JSON
//! logotext --output json image ./logos/acme.png --comprehensive
//!
//! # Inspect, check, or reset the cache
//! logotext stats
//! logotext validate
//! logotext clear
//! ```

use std::path::PathBuf;

use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Cached text extraction for logo and trademark images.
///
/// Sends images to a vision model once and remembers the answer, keyed by
/// file path, size, and modification time.
#[derive(Debug, Parser)]
#[command(name = "logotext")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Path to a config file (default: platform config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the text cache
    #[arg(long, value_name = "DIR", global = true, env = "LOGOTEXT_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract text from every image in one or more folders
    Extract(ExtractArgs),
    /// Extract text from a single image
    Image(ImageArgs),
    /// Show cache statistics
    Stats,
    /// Check the cache file for problems without modifying it
    Validate,
    /// Delete every cached result
    Clear,
}

/// Arguments for the extract subcommand.
#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Folders to process
    #[arg(value_name = "FOLDER", required = true)]
    pub folders: Vec<PathBuf>,

    /// Number of concurrent workers (requests stay globally paced)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Descend into subfolders
    #[arg(short, long)]
    pub recursive: bool,

    /// Skip files of this size or smaller (e.g. 100, 2KB, 1KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,
}

/// Arguments for the image subcommand.
#[derive(Debug, Args)]
pub struct ImageArgs {
    /// Image to read
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Ask several differently worded questions and merge the answers
    #[arg(short, long)]
    pub comprehensive: bool,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

/// Parse a human-readable size string into bytes.
///
/// ```
/// use logotext::cli::parse_size;
///
/// assert_eq!(parse_size("100").unwrap(), 100);
/// assert_eq!(parse_size("2KB").unwrap(), 2_000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1_024);
/// ```
///
/// # Errors
///
/// Returns a message if the string is not a valid size.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    s.parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}
