//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display progress in the terminal while a batch is listed and extracted.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Phase name reported while folders are listed.
pub const PHASE_LISTING: &str = "listing";

/// Phase name reported while images are extracted.
pub const PHASE_EXTRACT: &str = "extract";

/// Progress callback for batch extraction.
///
/// Implement this trait to receive progress updates from
/// [`crate::extract::TextExtractor::extract_text_from_folders`].
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_LISTING`] or [`PHASE_EXTRACT`])
    /// * `total` - Total number of items to process (0 when unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called before each item is processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed.
    ///
    /// # Arguments
    ///
    /// * `success` - Whether the item produced a result
    fn on_item_completed(&self, _success: bool) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    listing: Mutex<Option<ProgressBar>>,
    extract: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use logotext::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            listing: Mutex::new(None),
            extract: Mutex::new(None),
            quiet,
        }
    }

    fn listing_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn extract_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        match phase {
            PHASE_LISTING => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::listing_style());
                pb.set_message("Listing folders");
                pb.enable_steady_tick(Duration::from_millis(100));
                if let Ok(mut slot) = self.listing.lock() {
                    *slot = Some(pb);
                }
            }
            _ => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::extract_style());
                pb.set_message("Extracting text");
                if let Ok(mut slot) = self.extract.lock() {
                    *slot = Some(pb);
                }
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        if let Ok(slot) = self.extract.lock() {
            if let Some(ref pb) = *slot {
                pb.set_position(current.saturating_sub(1) as u64);
                pb.set_message(truncate_path(path, 30));
            }
        }
    }

    fn on_item_completed(&self, _success: bool) {
        if self.quiet {
            return;
        }
        if let Ok(slot) = self.extract.lock() {
            if let Some(ref pb) = *slot {
                pb.inc(1);
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let (slot, message) = match phase {
            PHASE_LISTING => (&self.listing, "Listing complete"),
            _ => (&self.extract, "Extraction complete"),
        };
        if let Some(pb) = slot.lock().ok().and_then(|mut s| s.take()) {
            pb.finish_with_message(message);
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
