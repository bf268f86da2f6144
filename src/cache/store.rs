//! JSON-backed text cache.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use super::entry::{CacheKey, CacheStats, IntegrityReport, COMPREHENSIVE_SUFFIX};
use crate::text::ExtractedText;

/// Name of the durable cache file inside the cache directory.
pub const CACHE_FILE_NAME: &str = "text_cache.json";

/// Lowercase phrases that mark an answer as commentary about the image.
pub const SUSPECT_MARKERS: &[&str] = &["based on", "reasoning:", "analysis:", "therefore"];

/// Errors that can occur while persisting the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading, writing, or renaming the cache file failed.
    #[error("Cache I/O error for {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The in-memory table could not be serialized.
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Persistent mapping from cache key to extracted text.
///
/// The in-memory table is authoritative for the lifetime of the process;
/// the JSON file is loaded once in [`TextCache::open`] and rewritten by
/// [`TextCache::flush`]. All access goes through `&self`, so one instance can
/// be shared between worker threads behind an `Arc`.
#[derive(Debug)]
pub struct TextCache {
    file: PathBuf,
    entries: RwLock<HashMap<String, ExtractedText>>,
}

impl TextCache {
    /// Open the cache stored in `dir`, creating the directory if needed.
    ///
    /// A missing, empty, or unreadable file yields an empty cache. A file that
    /// is not a JSON object is moved aside to `text_cache.json.backup_<ts>`.
    /// Nothing here is fatal: at worst the cache runs memory-only.
    pub fn open(dir: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(dir) {
            log::warn!(
                "Cannot create cache directory {}, running without persistence: {}",
                dir.display(),
                e
            );
        }
        let file = dir.join(CACHE_FILE_NAME);
        let entries = load_entries(&file);
        log::debug!("Loaded {} cached entries from {}", entries.len(), file.display());

        Self {
            file,
            entries: RwLock::new(entries),
        }
    }

    /// Inspect the cache file in `dir` without loading or modifying it.
    ///
    /// A missing file yields a healthy, empty report. Malformed content is
    /// described in the report rather than returned as an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the file exists but cannot be read.
    pub fn validate(dir: &Path) -> CacheResult<IntegrityReport> {
        let file = dir.join(CACHE_FILE_NAME);
        let mut report = IntegrityReport {
            path: file.clone(),
            ..Default::default()
        };

        let content = match fs::read(&file) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(report),
            Err(source) => return Err(CacheError::Io { path: file, source }),
        };
        report.exists = true;

        // Loading treats an empty file as an empty cache.
        if content.iter().all(u8::is_ascii_whitespace) {
            report.is_object = true;
            return Ok(report);
        }

        let map = match serde_json::from_slice::<serde_json::Value>(&content) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => return Ok(report),
            Err(e) => {
                report.parse_error = Some(e.to_string());
                return Ok(report);
            }
        };

        report.is_object = true;
        report.total_entries = map.len();
        for (key, value) in &map {
            match value {
                serde_json::Value::String(text) => {
                    report.valid_entries += 1;
                    let lower = text.to_lowercase();
                    if SUSPECT_MARKERS.iter().any(|marker| lower.contains(marker)) {
                        report.suspect_keys.push(key.clone());
                    }
                }
                _ => report.invalid_keys.push(key.clone()),
            }
        }
        report.invalid_keys.sort();
        report.suspect_keys.sort();

        log::debug!(
            "Validated {}: {} valid, {} invalid, {} suspect",
            report.path.display(),
            report.valid_entries,
            report.invalid_keys.len(),
            report.suspect_keys.len()
        );
        Ok(report)
    }

    /// Path of the durable cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ExtractedText>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ExtractedText>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a cached result.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<ExtractedText> {
        self.read().get(&key.to_string()).cloned()
    }

    /// Whether a result is cached for `key`.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.read().contains_key(&key.to_string())
    }

    /// Store a result in memory.
    ///
    /// Entries are immutable: if `key` already holds a value the call is a
    /// no-op and returns `false`.
    pub fn put(&self, key: &CacheKey, text: ExtractedText) -> bool {
        let mut entries = self.write();
        match entries.entry(key.to_string()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(text);
                true
            }
        }
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Rewrite the durable file from the in-memory table.
    ///
    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash mid-write leaves the previous file intact.
    pub fn flush(&self) -> CacheResult<()> {
        let json = {
            let entries = self.read();
            let ordered: BTreeMap<&str, &str> = entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            serde_json::to_string_pretty(&ordered)?
        };

        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.file.with_file_name(format!("{CACHE_FILE_NAME}.tmp"));
        let result = write_file(&tmp, json.as_bytes()).and_then(|()| {
            fs::rename(&tmp, &self.file).map_err(|source| CacheError::Io {
                path: self.file.clone(),
                source,
            })
        });

        match result {
            Ok(()) => {
                log::debug!("Cache saved: {} entries to {}", self.len(), self.file.display());
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                Err(e)
            }
        }
    }

    /// Drop every entry and delete the durable file.
    ///
    /// Always succeeds; a missing file is fine and other removal failures are
    /// logged.
    pub fn clear(&self) {
        self.write().clear();
        match fs::remove_file(&self.file) {
            Ok(()) => log::info!("Deleted cache file {}", self.file.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to delete cache file {}: {}", self.file.display(), e),
        }
    }

    /// Summarize the cache contents.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = self.read();
        let mut stats = CacheStats {
            entries: entries.len(),
            file_bytes: fs::metadata(&self.file).ok().map(|m| m.len()),
            ..Default::default()
        };
        for (key, text) in entries.iter() {
            if text.is_empty() {
                stats.empty += 1;
            } else {
                stats.with_text += 1;
            }
            if key.ends_with(COMPREHENSIVE_SUFFIX) {
                stats.comprehensive += 1;
            }
            stats.text_bytes += text.len() as u64;
            stats.approx_bytes += (key.len() + text.len()) as u64;
        }
        stats
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> CacheResult<()> {
    let io_err = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)
}

fn load_entries(file: &Path) -> HashMap<String, ExtractedText> {
    let content = match fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No existing cache file at {}", file.display());
            return HashMap::new();
        }
        Err(e) => {
            log::warn!("Failed to read cache file {}: {}", file.display(), e);
            return HashMap::new();
        }
    };

    if content.trim().is_empty() {
        log::warn!("Cache file is empty: {}", file.display());
        return HashMap::new();
    }

    let map = match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) => {
            log::warn!("Cache file {} is not a JSON object", file.display());
            backup_corrupted(file);
            return HashMap::new();
        }
        Err(e) => {
            log::warn!("Cache file {} is corrupted: {}", file.display(), e);
            backup_corrupted(file);
            return HashMap::new();
        }
    };

    let total = map.len();
    let entries: HashMap<String, ExtractedText> = map
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(text) => Some((key, ExtractedText::from_stored(text))),
            _ => None,
        })
        .collect();

    let invalid = total - entries.len();
    if invalid > 0 {
        log::warn!("Dropped {} invalid cache entries from {}", invalid, file.display());
    }
    entries
}

fn backup_corrupted(file: &Path) {
    let backup = PathBuf::from(format!(
        "{}.backup_{}",
        file.display(),
        chrono::Utc::now().timestamp()
    ));
    match fs::rename(file, &backup) {
        Ok(()) => log::warn!("Corrupted cache backed up to {}", backup.display()),
        Err(e) => log::warn!("Failed to back up corrupted cache {}: {}", file.display(), e),
    }
}
