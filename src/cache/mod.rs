//! Persistent text cache for LogoText.
//!
//! This module stores extracted text keyed by file fingerprint so that
//! unchanged images are never sent to the recognition service twice.
//!
//! # Architecture
//!
//! The caching system is split into two main components:
//!
//! * [`store`]: The in-memory table, its JSON persistence, and load-time recovery.
//! * [`entry`]: Cache keys (single-pass vs. comprehensive namespaces) and statistics.
//!
//! # Consistency
//!
//! `put` only touches memory. The durable file is rewritten wholesale by an
//! explicit `flush`, normally once per batch. A crash between `put` and
//! `flush` loses those entries, which costs a repeated network call and
//! nothing else.
//!
//! Entries are immutable: the first value written for a key wins.
//!
//! # Integrity
//!
//! Loading repairs what it can: an unparseable file is moved aside and
//! non-string values are dropped. [`TextCache::validate`] reports the same
//! problems without touching the file, so they can be inspected first.

pub mod entry;
pub mod store;

pub use entry::{CacheKey, CacheStats, IntegrityReport, COMPREHENSIVE_SUFFIX};
pub use store::{CacheError, CacheResult, TextCache, CACHE_FILE_NAME, SUSPECT_MARKERS};
