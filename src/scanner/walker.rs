//! Folder walker for image discovery.
//!
//! Lists the images inside one folder, applying the extension allow-list and
//! the minimum-size sanity bound. Entries come out sorted by file name within
//! each directory; the order carries no meaning beyond being reproducible.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{is_image_path, ImageEntry, ScanError, WalkerConfig};

/// Folder walker for image discovery.
#[derive(Debug)]
pub struct Walker {
    /// Folder to list
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given folder.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check the root before walking.
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`] so the
    /// caller can skip a bad folder without aborting the whole batch.
    pub fn validate_root(&self) -> Result<(), ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(m) if m.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ScanError::NotFound(self.root.clone()))
            }
            Err(e) => Err(ScanError::Io {
                path: self.root.clone(),
                source: e,
            }),
        }
    }

    /// Walk the folder, yielding qualifying images.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<ImageEntry, ScanError>> + '_ {
        let max_depth = if self.config.recursive { usize::MAX } else { 1 };

        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    let path = entry.path();
                    if !is_image_path(path) {
                        log::trace!("Skipping non-image: {}", path.display());
                        return None;
                    }
                    match entry.metadata() {
                        Ok(metadata) => self.process_file(path.to_path_buf(), metadata.len()),
                        Err(e) => {
                            // Unreadable metadata: the file is skipped, not failed.
                            log::debug!("Skipping {}: {}", path.display(), e);
                            None
                        }
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                    Some(Err(ScanError::Io { path, source }))
                }
            })
    }

    fn process_file(&self, path: PathBuf, size: u64) -> Option<Result<ImageEntry, ScanError>> {
        if size <= self.config.min_file_size {
            log::trace!("Skipping degenerate file ({} bytes): {}", size, path.display());
            return None;
        }
        Some(Ok(ImageEntry::new(path, size)))
    }
}
