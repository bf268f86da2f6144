//! logotext - cached text extraction for logo and trademark images
//!
//! Delegates recognition to an external vision model and keeps every answer
//! in a persistent cache keyed by file fingerprint, so a folder of thousands
//! of images is only sent over the network once.
//!
//! The library entry point is [`extract::TextExtractor`]; [`run_app`] is the
//! thin CLI built on top of it.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod output;
pub mod progress;
pub mod recognition;
pub mod scanner;
pub mod signal;
pub mod text;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cache::TextCache;
use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::error::ExitCode;
use crate::extract::TextExtractor;
use crate::output::BatchReport;
use crate::progress::Progress;
use crate::recognition::ChatCompletionsClient;

pub use crate::error::ExtractError;
pub use crate::text::ExtractedText;

/// Run the CLI and return the exit code to use.
///
/// # Errors
///
/// Returns an error for failures that stop the command outright, such as an
/// unusable single image or a broken HTTP client setup. Per-file failures in
/// a batch are reported through [`ExitCode::PartialSuccess`] instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut config = match cli.config {
        Some(ref path) => Config::load_from_path(path),
        None => Config::load(),
    };
    config.merge_cli(&cli);
    if let Commands::Extract(ref args) = cli.command {
        config.merge_extract_args(args);
    }
    log::debug!("Using cache directory {}", config.cache_dir.display());

    let json = cli.output == OutputFormat::Json;
    let open_cache = || Arc::new(TextCache::open(&config.cache_dir));
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Validate => {
            // Opening the cache would repair the file, so inspect it directly.
            let report = TextCache::validate(&config.cache_dir).with_context(|| {
                format!("Could not read cache in {}", config.cache_dir.display())
            })?;
            output::write_integrity_report(&mut stdout, &report, json)?;
            Ok(if report.is_healthy() {
                ExitCode::Success
            } else {
                ExitCode::GeneralError
            })
        }
        Commands::Stats => {
            let cache = open_cache();
            output::write_cache_stats(&mut stdout, cache.path(), &cache.stats(), json)?;
            Ok(ExitCode::Success)
        }
        Commands::Clear => {
            let cache = open_cache();
            let before = cache.len();
            cache.clear();
            if !cli.quiet {
                writeln!(stdout, "Removed {} cached entries", before)?;
            }
            Ok(ExitCode::Success)
        }
        Commands::Image(args) => {
            let extractor = build_extractor(&config, open_cache())?;
            let text = if args.comprehensive {
                extractor.extract_text_comprehensive(&args.path)
            } else {
                extractor.extract_text(&args.path)
            }
            .with_context(|| format!("Could not extract text from {}", args.path.display()))?;

            if let Err(e) = extractor.cache().flush() {
                log::warn!("Failed to persist text cache: {}", e);
            }
            output::write_image(&mut stdout, &args.path, &text, args.comprehensive, json)?;
            Ok(ExitCode::Success)
        }
        Commands::Extract(args) => {
            let handler = signal::install_handler()?;
            let progress = Arc::new(Progress::new(cli.quiet || json));
            let extractor = build_extractor(&config, open_cache())?
                .with_shutdown_flag(handler.get_flag())
                .with_progress_callback(progress);

            let summary = extractor.extract_text_from_folders(&args.folders);
            let code = if summary.interrupted {
                ExitCode::Interrupted
            } else if summary.fail_count > 0 {
                ExitCode::PartialSuccess
            } else {
                ExitCode::Success
            };

            let report = BatchReport::new(&summary, extractor.stats(), code);
            if json {
                report.write_json(&mut stdout)?;
            } else if !cli.quiet {
                report.write_text(&mut stdout)?;
            }
            Ok(code)
        }
    }
}

fn build_extractor(config: &Config, cache: Arc<TextCache>) -> Result<TextExtractor> {
    if config.api_key.is_empty() {
        log::warn!(
            "No API key configured; set {}API_KEY or {}",
            config::ENV_PREFIX,
            config::API_KEY_FALLBACK_ENV
        );
    }
    let client = ChatCompletionsClient::new(config.http_config())
        .context("Failed to create recognition client")?;
    log::debug!("Using model {} at {}", client.model(), config.api_url);

    Ok(TextExtractor::new(
        cache,
        Arc::new(client),
        config.extractor_config(),
    ))
}
