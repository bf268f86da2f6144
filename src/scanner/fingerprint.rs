//! Stable file identities for the text cache.
//!
//! # Overview
//!
//! A [`Fingerprint`] is a BLAKE3 digest over a file's normalized absolute path,
//! its size, and its modification time (nanoseconds). Rewriting a file moves
//! its mtime or size, so the fingerprint changes and the old cache entry is
//! simply never looked up again.
//!
//! Paths are normalized to Unicode NFC before hashing. macOS hands out NFD
//! file names while Linux and Windows usually use NFC, and the same logical
//! file must map to the same key on every platform.
//!
//! When `stat` fails the fingerprint degrades to a hash of the path alone.
//! Such keys never invalidate on change, but the caller still gets a key.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use unicode_normalization::UnicodeNormalization;

/// Length of the hex-encoded fingerprint.
pub const FINGERPRINT_LEN: usize = 64;

/// Deterministic identity of a file at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for `path`.
    ///
    /// Never fails: unreadable metadata falls back to [`Fingerprint::of_path`].
    #[must_use]
    pub fn of_file(path: &Path) -> Self {
        let key = path_key(path);
        match std::fs::metadata(path) {
            Ok(metadata) => {
                let mtime = metadata
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map_or(0, |d| d.as_nanos());
                let input = format!("{}_{}_{}", key, metadata.len(), mtime);
                Self::from_bytes(input.as_bytes())
            }
            Err(e) => {
                log::warn!(
                    "Cannot stat {}, using path-only fingerprint: {}",
                    path.display(),
                    e
                );
                Self::from_bytes(key.as_bytes())
            }
        }
    }

    /// Fingerprint derived from the path alone.
    #[must_use]
    pub fn of_path(path: &Path) -> Self {
        Self::from_bytes(path_key(path).as_bytes())
    }

    /// Wrap an existing hex digest, e.g. one read back from the durable cache.
    ///
    /// Returns `None` unless `hex` is exactly 64 lowercase hex characters.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = hex.len() == FINGERPRINT_LEN
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(hex.to_string()))
    }

    fn from_bytes(input: &[u8]) -> Self {
        Self(blake3::hash(input).to_hex().to_string())
    }

    /// The hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute, lexically cleaned, NFC-normalized form of `path`.
///
/// Relative paths are resolved against the current directory. Symlinks are
/// not resolved, so the result does not depend on the file existing.
#[must_use]
pub fn path_key(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }

    cleaned.to_string_lossy().nfc().collect()
}
