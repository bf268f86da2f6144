//! Cached text extraction.
//!
//! # Overview
//!
//! [`TextExtractor`] ties the pieces together:
//! 1. **Fingerprint** the file (see [`crate::scanner::fingerprint`])
//! 2. **Look up** the fingerprint in the [`TextCache`]
//! 3. On a miss, **prepare** the image and ask the [`RecognitionService`]
//! 4. **Sanitize** the answer and store it under the fingerprint
//!
//! Three entry points build on that flow:
//! - [`TextExtractor::extract_text`]: one request per image ([`single`])
//! - [`TextExtractor::extract_text_comprehensive`]: three differently worded
//!   requests merged into one answer ([`consensus`])
//! - [`TextExtractor::extract_text_from_folders`]: a failure-isolated batch
//!   over whole folders ([`batch`])
//!
//! Errors from the service are never cached, so a file that failed is tried
//! again on the next call.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use logotext::cache::TextCache;
//! use logotext::extract::{ExtractorConfig, TextExtractor};
//! use logotext::recognition::{ChatCompletionsClient, HttpClientConfig};
//!
//! let cache = Arc::new(TextCache::open(Path::new(".cache")));
//! let client = ChatCompletionsClient::new(HttpClientConfig::default())?;
//! let extractor = TextExtractor::new(cache, Arc::new(client), ExtractorConfig::default());
//!
//! let text = extractor.extract_text("logo.png")?;
//! println!("{}", text);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod consensus;
pub mod pacing;
pub mod single;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::{CacheKey, CacheStats, TextCache};
use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use crate::recognition::RecognitionService;
use crate::scanner::prepare::DEFAULT_MAX_DIMENSION;
use crate::scanner::{EncodedImage, Fingerprint, ImagePreparer, WalkerConfig};
use crate::text::{sanitize_str, ExtractedText};

pub use batch::BatchSummary;
pub use consensus::{CONSENSUS_INSTRUCTIONS, CONSENSUS_SEPARATOR};
pub use pacing::RequestPacer;
pub use single::SINGLE_PASS_INSTRUCTION;

/// Tuning knobs for [`TextExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Longest edge, in pixels, of the image sent to the service.
    pub max_dimension: u32,
    /// Minimum spacing between any two recognition requests.
    pub min_request_interval: Duration,
    /// Pause between the consensus sub-requests for one image.
    pub consensus_pause: Duration,
    /// Pause after each batch item that needed the network.
    pub item_delay: Duration,
    /// Number of batch workers. 1 keeps the batch sequential.
    pub workers: usize,
    /// Which files a batch picks up.
    pub walker: WalkerConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            min_request_interval: Duration::from_millis(800),
            consensus_pause: Duration::from_millis(500),
            item_delay: Duration::from_millis(100),
            workers: 1,
            walker: WalkerConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Configuration with every delay set to zero.
    ///
    /// Meant for local services and tests.
    #[must_use]
    pub fn unpaced() -> Self {
        Self {
            min_request_interval: Duration::ZERO,
            consensus_pause: Duration::ZERO,
            item_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Set the number of batch workers.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set whether batches descend into subfolders.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.walker.recursive = recursive;
        self
    }
}

/// Request and cache counters since construction or the last clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractorStats {
    /// Extraction requests answered, from cache or otherwise.
    pub total_requests: usize,
    /// Requests answered from the cache.
    pub cache_hits: usize,
    /// Requests that needed the recognition service.
    pub cache_misses: usize,
}

impl ExtractorStats {
    /// Percentage of requests answered from the cache.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / self.total_requests as f64) * 100.0
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    total_requests: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> ExtractorStats {
        ExtractorStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }
}

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    Cached,
    Fetched,
}

/// Cached front end to a [`RecognitionService`].
///
/// Owns no global state: the cache and the service are handed in, so one
/// process can run several extractors against different cache directories.
pub struct TextExtractor {
    cache: Arc<TextCache>,
    service: Arc<dyn RecognitionService>,
    preparer: ImagePreparer,
    pacer: RequestPacer,
    config: ExtractorConfig,
    counters: Counters,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExtractor")
            .field("cache", &self.cache.path())
            .field("service", &self.service.name())
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl TextExtractor {
    /// Create an extractor over `cache` and `service`.
    #[must_use]
    pub fn new(
        cache: Arc<TextCache>,
        service: Arc<dyn RecognitionService>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            preparer: ImagePreparer::new(config.max_dimension),
            pacer: RequestPacer::new(config.min_request_interval),
            cache,
            service,
            config,
            counters: Counters::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag checked between batch items.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback used by batches.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The cache this extractor reads and writes.
    #[must_use]
    pub fn cache(&self) -> &Arc<TextCache> {
        &self.cache
    }

    /// Split `paths` into those with a cached single-pass result and those
    /// without. Touches neither the network nor the counters.
    pub fn partition_cached<P: AsRef<Path>>(&self, paths: &[P]) -> (Vec<PathBuf>, Vec<PathBuf>) {
        paths
            .iter()
            .map(|p| p.as_ref().to_path_buf())
            .partition(|path| {
                self.cache
                    .contains(&CacheKey::Single(Fingerprint::of_file(path)))
            })
    }

    /// Empty the cache, delete its file, and reset the counters.
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.counters.reset();
        log::info!("Text cache cleared");
    }

    /// Size of the cache.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Request counters.
    #[must_use]
    pub fn stats(&self) -> ExtractorStats {
        self.counters.snapshot()
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Cache lookup that feeds the counters.
    fn lookup(&self, key: &CacheKey) -> Option<ExtractedText> {
        self.counters.total_requests.fetch_add(1, Ordering::Relaxed);
        match self.cache.get(key) {
            Some(text) => {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                log::trace!("Cache hit: {}", key);
                Some(text)
            }
            None => {
                self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
                log::trace!("Cache miss: {}", key);
                None
            }
        }
    }

    /// Store `text` under `key` and return the value the cache now holds.
    ///
    /// If another worker stored a value first, that value wins.
    fn store(&self, key: &CacheKey, text: ExtractedText) -> ExtractedText {
        if self.cache.put(key, text.clone()) {
            text
        } else {
            log::debug!("Cache entry {} already written, keeping existing value", key);
            self.cache.get(key).unwrap_or(text)
        }
    }

    fn prepare(&self, path: &Path) -> Result<EncodedImage, ExtractError> {
        self.preparer
            .prepare(path)
            .map_err(|source| ExtractError::Prepare {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Send one paced request and sanitize the answer.
    fn recognize(
        &self,
        path: &Path,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<ExtractedText, ExtractError> {
        self.pacer.wait();
        let raw = self
            .service
            .recognize(image, instruction)
            .map_err(|source| ExtractError::Recognition {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(sanitize_str(&raw))
    }
}
