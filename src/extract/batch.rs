//! Failure-isolated batch extraction over folders.
//!
//! # Overview
//!
//! 1. **Listing**: every folder is walked with the configured
//!    [`WalkerConfig`](crate::scanner::WalkerConfig); missing folders are
//!    skipped with a warning and duplicate paths are dropped.
//! 2. **Extraction**: each image goes through the single-pass extractor.
//!    Failures are counted and collected, never propagated.
//! 3. **Persistence**: the cache is flushed once, after every item settled.
//!
//! With `workers > 1` the extraction phase runs on a bounded rayon pool. The
//! shared [`RequestPacer`](super::RequestPacer) keeps the request rate
//! bounded regardless of the worker count.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;

use rayon::prelude::*;

use super::{Source, TextExtractor};
use crate::error::ExtractError;
use crate::progress::{PHASE_EXTRACT, PHASE_LISTING};
use crate::scanner::{path_key, Walker};

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Images found across all folders.
    pub total_files: usize,
    /// Images that produced a result, including cached and "no text" answers.
    pub success_count: usize,
    /// Images that failed to prepare or recognize.
    pub fail_count: usize,
    /// Successful images answered from the cache.
    pub cached_count: usize,
    /// Folders that were missing or not directories.
    pub skipped_folders: usize,
    /// Whether the run stopped early on a shutdown request.
    pub interrupted: bool,
    /// One error per failed image.
    pub errors: Vec<ExtractError>,
}

impl BatchSummary {
    /// Images that were attempted, successfully or not.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.success_count + self.fail_count
    }

    /// Whether every image found was processed without error.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        !self.interrupted && self.fail_count == 0 && self.processed() == self.total_files
    }
}

enum Outcome {
    Done(Source),
    Failed(ExtractError),
    Skipped,
}

impl TextExtractor {
    /// Extract text from every qualifying image in `folders`.
    ///
    /// Never fails: per-file errors are logged, counted, and returned in
    /// [`BatchSummary::errors`]. The cache is flushed once at the end; a
    /// flush failure is logged and the results stay in memory.
    pub fn extract_text_from_folders<P: AsRef<Path>>(&self, folders: &[P]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        let files = self.list_images(folders, &mut summary);
        summary.total_files = files.len();

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(PHASE_EXTRACT, files.len());
        }
        log::info!(
            "Extracting text from {} images with {} worker(s)",
            files.len(),
            self.config.workers
        );

        let outcomes = if self.config.workers <= 1 || files.len() <= 1 {
            self.run_sequential(&files)
        } else {
            self.run_parallel(&files)
        };

        for outcome in outcomes {
            match outcome {
                Outcome::Done(source) => {
                    summary.success_count += 1;
                    if source == Source::Cached {
                        summary.cached_count += 1;
                    }
                }
                Outcome::Failed(e) => {
                    summary.fail_count += 1;
                    summary.errors.push(e);
                }
                Outcome::Skipped => {}
            }
        }
        summary.interrupted = self.is_shutdown_requested();

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(PHASE_EXTRACT);
        }

        if let Err(e) = self.cache.flush() {
            log::warn!("Failed to persist text cache: {}", e);
        }

        log::info!(
            "Batch complete: {} succeeded ({} cached), {} failed, {} total{}",
            summary.success_count,
            summary.cached_count,
            summary.fail_count,
            summary.total_files,
            if summary.interrupted { " (interrupted)" } else { "" }
        );

        summary
    }

    fn list_images<P: AsRef<Path>>(
        &self,
        folders: &[P],
        summary: &mut BatchSummary,
    ) -> Vec<PathBuf> {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(PHASE_LISTING, folders.len());
        }

        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for folder in folders {
            let folder = folder.as_ref();
            let mut walker = Walker::new(folder, self.config.walker.clone());
            if let Some(ref flag) = self.shutdown_flag {
                walker = walker.with_shutdown_flag(flag.clone());
            }

            if let Err(e) = walker.validate_root() {
                log::warn!("Skipping folder: {}", e);
                summary.skipped_folders += 1;
                continue;
            }

            let before = files.len();
            for result in walker.walk() {
                match result {
                    Ok(entry) => {
                        if seen.insert(path_key(&entry.path)) {
                            files.push(entry.path);
                        }
                    }
                    Err(e) => log::warn!("Error while listing {}: {}", folder.display(), e),
                }
            }
            log::debug!("Found {} images in {}", files.len() - before, folder.display());
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(PHASE_LISTING);
        }

        files
    }

    fn run_sequential(&self, files: &[PathBuf]) -> Vec<Outcome> {
        files
            .iter()
            .enumerate()
            .map(|(idx, path)| self.process_item(idx, path))
            .collect()
    }

    fn run_parallel(&self, files: &[PathBuf]) -> Vec<Outcome> {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
        {
            Ok(pool) => pool.install(|| {
                files
                    .par_iter()
                    .enumerate()
                    .map(|(idx, path)| self.process_item(idx, path))
                    .collect()
            }),
            Err(e) => {
                log::warn!("Failed to create worker pool, running sequentially: {}", e);
                self.run_sequential(files)
            }
        }
    }

    /// Process one batch item. Shutdown is only checked here, between items.
    fn process_item(&self, idx: usize, path: &Path) -> Outcome {
        if self.is_shutdown_requested() {
            log::trace!("Shutdown requested, skipping {}", path.display());
            return Outcome::Skipped;
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_progress(idx + 1, path.to_string_lossy().as_ref());
        }

        let result = self.extract_single(path);
        let used_network = matches!(
            result,
            Ok((_, Source::Fetched)) | Err(ExtractError::Recognition { .. })
        );

        let outcome = match result {
            Ok((text, source)) => {
                log::debug!(
                    "{} {}: {}",
                    if source == Source::Cached { "Cached" } else { "Extracted" },
                    path.display(),
                    if text.is_empty() { "<no text>" } else { text.as_str() }
                );
                Outcome::Done(source)
            }
            Err(e) => {
                log::warn!("{}", e);
                Outcome::Failed(e)
            }
        };

        if let Some(ref callback) = self.progress_callback {
            callback.on_item_completed(matches!(outcome, Outcome::Done(_)));
        }

        if used_network && !self.config.item_delay.is_zero() {
            thread::sleep(self.config.item_delay);
        }

        outcome
    }
}
