//! Rendering of CLI results as text or JSON.
//!
//! # Batch schema
//!
//! ```json
//! {
//!   "summary": {
//!     "total_files": 3,
//!     "success_count": 2,
//!     "fail_count": 1,
//!     "cached_count": 1,
//!     "skipped_folders": 0,
//!     "interrupted": false
//!   },
//!   "failures": [
//!     { "path": "/logos/corrupt.png", "error": "Failed to prepare ...", "transient": false }
//!   ],
//!   "stats": { "total_requests": 3, "cache_hits": 1, "cache_misses": 2 },
//!   "exit_code": 3
//! }
//! ```

use std::io::Write;
use std::path::Path;

use bytesize::ByteSize;
use serde::Serialize;

use crate::cache::{CacheStats, IntegrityReport};
use crate::error::ExitCode;
use crate::extract::{BatchSummary, ExtractorStats};
use crate::text::ExtractedText;

#[derive(Debug, Serialize)]
struct JsonSummary {
    total_files: usize,
    success_count: usize,
    fail_count: usize,
    cached_count: usize,
    skipped_folders: usize,
    interrupted: bool,
}

#[derive(Debug, Serialize)]
struct JsonFailure {
    path: String,
    error: String,
    transient: bool,
}

/// Batch result ready for printing.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    summary: JsonSummary,
    failures: Vec<JsonFailure>,
    stats: ExtractorStats,
    exit_code: i32,
}

impl BatchReport {
    /// Build a report from a finished batch.
    #[must_use]
    pub fn new(summary: &BatchSummary, stats: ExtractorStats, exit_code: ExitCode) -> Self {
        Self {
            summary: JsonSummary {
                total_files: summary.total_files,
                success_count: summary.success_count,
                fail_count: summary.fail_count,
                cached_count: summary.cached_count,
                skipped_folders: summary.skipped_folders,
                interrupted: summary.interrupted,
            },
            failures: summary
                .errors
                .iter()
                .map(|e| JsonFailure {
                    path: e.path().display().to_string(),
                    error: e.to_string(),
                    transient: e.is_transient(),
                })
                .collect(),
            stats,
            exit_code: exit_code.as_i32(),
        }
    }

    /// Write as pretty JSON.
    pub fn write_json<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)
    }

    /// Write as human-readable text.
    pub fn write_text<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let s = &self.summary;
        writeln!(
            writer,
            "Processed {} of {} images: {} succeeded ({} from cache), {} failed",
            s.success_count + s.fail_count,
            s.total_files,
            s.success_count,
            s.cached_count,
            s.fail_count
        )?;
        if s.skipped_folders > 0 {
            writeln!(writer, "Skipped {} missing folder(s)", s.skipped_folders)?;
        }
        for failure in &self.failures {
            writeln!(writer, "  failed: {}", failure.error)?;
        }
        writeln!(
            writer,
            "Cache hit rate: {:.1}% ({} hits, {} misses)",
            self.stats.hit_rate(),
            self.stats.cache_hits,
            self.stats.cache_misses
        )?;
        if s.interrupted {
            writeln!(writer, "Interrupted before all images were processed")?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct JsonImage<'a> {
    path: String,
    comprehensive: bool,
    has_text: bool,
    text: &'a str,
}

/// Write a single-image result.
pub fn write_image<W: Write>(
    writer: &mut W,
    path: &Path,
    text: &ExtractedText,
    comprehensive: bool,
    json: bool,
) -> std::io::Result<()> {
    if json {
        let record = JsonImage {
            path: path.display().to_string(),
            comprehensive,
            has_text: !text.is_empty(),
            text: text.as_str(),
        };
        serde_json::to_writer_pretty(&mut *writer, &record)?;
        writeln!(writer)
    } else if text.is_empty() {
        writeln!(writer, "(no text)")
    } else {
        writeln!(writer, "{}", text)
    }
}

/// Write cache statistics.
pub fn write_cache_stats<W: Write>(
    writer: &mut W,
    cache_path: &Path,
    stats: &CacheStats,
    json: bool,
) -> std::io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *writer, stats)?;
        return writeln!(writer);
    }

    writeln!(writer, "Cache file:     {}", cache_path.display())?;
    writeln!(writer, "Entries:        {}", stats.entries)?;
    writeln!(writer, "  with text:    {}", stats.with_text)?;
    writeln!(writer, "  no text:      {}", stats.empty)?;
    writeln!(writer, "  comprehensive: {}", stats.comprehensive)?;
    writeln!(writer, "Avg text len:   {:.1}", stats.average_text_len())?;
    writeln!(writer, "Memory (approx): {}", ByteSize(stats.approx_bytes))?;
    match stats.file_bytes {
        Some(bytes) => writeln!(writer, "File size:      {}", ByteSize(bytes)),
        None => writeln!(writer, "File size:      (not written yet)"),
    }
}

/// Write the result of a cache integrity check.
pub fn write_integrity_report<W: Write>(
    writer: &mut W,
    report: &IntegrityReport,
    json: bool,
) -> std::io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *writer, report)?;
        return writeln!(writer);
    }

    writeln!(writer, "Cache file: {}", report.path.display())?;
    if !report.exists {
        return writeln!(writer, "No cache file yet");
    }
    if let Some(ref error) = report.parse_error {
        return writeln!(writer, "Not valid JSON: {}", error);
    }
    if !report.is_object {
        return writeln!(writer, "Top-level value is not an object");
    }

    writeln!(writer, "{} entries, {} valid", report.total_entries, report.valid_entries)?;
    for key in &report.invalid_keys {
        writeln!(writer, "  non-text value: {}", key)?;
    }
    for key in &report.suspect_keys {
        writeln!(writer, "  suspect text:   {}", key)?;
    }
    if report.is_healthy() {
        writeln!(writer, "Cache is healthy")
    } else {
        writeln!(writer, "Cache has problems; `logotext clear` rebuilds it from scratch")
    }
}
