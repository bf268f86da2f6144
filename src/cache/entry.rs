//! Cache keys and statistics.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::Fingerprint;

/// Suffix appended to fingerprints for comprehensive (consensus) results.
pub const COMPREHENSIVE_SUFFIX: &str = "_comprehensive";

/// Key into the text cache.
///
/// Single-pass and comprehensive results for the same file live under
/// different keys so neither strategy overwrites the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Result of one recognition request.
    Single(Fingerprint),
    /// Merged result of the consensus requests.
    Comprehensive(Fingerprint),
}

impl CacheKey {
    /// The fingerprint this key is derived from.
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        match self {
            Self::Single(fp) | Self::Comprehensive(fp) => fp,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(fp) => write!(f, "{fp}"),
            Self::Comprehensive(fp) => write!(f, "{fp}{COMPREHENSIVE_SUFFIX}"),
        }
    }
}

/// Snapshot of cache contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of entries.
    pub entries: usize,
    /// Entries holding text.
    pub with_text: usize,
    /// Entries recording "no text present".
    pub empty: usize,
    /// Entries in the comprehensive namespace.
    pub comprehensive: usize,
    /// Total bytes of cached text.
    pub text_bytes: u64,
    /// Approximate in-memory size of keys and values, in bytes.
    pub approx_bytes: u64,
    /// Size of the durable file, if it exists.
    pub file_bytes: Option<u64>,
}

impl CacheStats {
    /// Mean text length over all entries.
    #[must_use]
    pub fn average_text_len(&self) -> f64 {
        if self.entries == 0 {
            0.0
        } else {
            self.text_bytes as f64 / self.entries as f64
        }
    }
}

/// Findings of a read-only check of the durable cache file.
///
/// Produced by [`TextCache::validate`](super::TextCache::validate), which
/// never repairs or moves the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// File that was inspected.
    pub path: PathBuf,
    /// Whether the file exists.
    pub exists: bool,
    /// Parser message when the file is not valid JSON.
    pub parse_error: Option<String>,
    /// Whether the top-level value is a JSON object.
    pub is_object: bool,
    /// Keys in the top-level object.
    pub total_entries: usize,
    /// Entries whose value is a string.
    pub valid_entries: usize,
    /// Keys whose value is not a string.
    pub invalid_keys: Vec<String>,
    /// Keys whose text reads like model commentary rather than image text.
    pub suspect_keys: Vec<String>,
}

impl IntegrityReport {
    /// Whether loading the file would keep every entry as-is.
    ///
    /// A missing file is healthy: it simply means nothing was cached yet.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        !self.exists
            || (self.parse_error.is_none()
                && self.is_object
                && self.invalid_keys.is_empty()
                && self.suspect_keys.is_empty())
    }
}
