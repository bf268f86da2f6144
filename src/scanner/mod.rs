//! Scanner module for image discovery, fingerprinting, and upload preparation.
//!
//! This module provides functionality for:
//! - Listing candidate images in a set of folders
//! - Deriving stable fingerprints from path, size, and mtime
//! - Downscaling and encoding images for the recognition service
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Folder listing with extension and size filters
//! - [`fingerprint`]: BLAKE3 cache keys
//! - [`prepare`]: Image loading, resizing, and base64 encoding
//!
//! # Example
//!
//! ```no_run
//! use logotext::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("logos"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(image) => println!("{}: {} bytes", image.path.display(), image.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod fingerprint;
pub mod prepare;
pub mod walker;

use std::path::{Path, PathBuf};

pub use fingerprint::{path_key, Fingerprint};
pub use prepare::{EncodedImage, ImagePreparer, PrepareError};
pub use walker::Walker;

/// File extensions (lowercase, without dot) accepted as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Files at or below this size are treated as degenerate and skipped.
pub const DEFAULT_MIN_FILE_SIZE: u64 = 100;

/// Check whether `path` has an allow-listed image extension (case-insensitive).
#[must_use]
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// A discovered image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl ImageEntry {
    /// Create a new ImageEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for folder walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Descend into subfolders instead of listing direct children only.
    pub recursive: bool,

    /// Files of this size or smaller are skipped.
    pub min_file_size: u64,

    /// Follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            min_file_size: DEFAULT_MIN_FILE_SIZE,
            follow_symlinks: true,
        }
    }
}

/// Errors that can occur while listing folders.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified folder was not found.
    #[error("Folder not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while reading a directory or file metadata.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
