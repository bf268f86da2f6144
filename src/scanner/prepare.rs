//! Image preparation for upload to the recognition service.
//!
//! Loads an image, converts it to RGB8, bounds its largest dimension, and
//! re-encodes it as PNG wrapped in base64. The size bound keeps request
//! payloads and latency flat no matter what resolution the source file has.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

/// Default bound on the longest image edge, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Hard ceiling on the decoded payload size the service accepts.
pub const MAX_PAYLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Errors that can occur while preparing an image.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// The file could not be opened or decoded as an image.
    #[error("Failed to load image {path}: {source}")]
    Decode {
        /// Offending file
        path: PathBuf,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding the (possibly resized) image failed.
    #[error("Failed to encode image {path}: {source}")]
    Encode {
        /// Offending file
        path: PathBuf,
        /// Underlying encoder error
        #[source]
        source: image::ImageError,
    },

    /// The encoded image is larger than the service accepts.
    #[error("Image {path} too large after encoding ({size} bytes)")]
    TooLarge {
        /// Offending file
        path: PathBuf,
        /// Encoded PNG size in bytes
        size: usize,
    },
}

/// An image ready to be sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Base64 (standard alphabet, padded) PNG bytes.
    pub base64: String,
    /// Width after resizing.
    pub width: u32,
    /// Height after resizing.
    pub height: u32,
}

impl EncodedImage {
    /// MIME type of the encoded payload.
    pub const MIME_TYPE: &'static str = "image/png";

    /// Render as a `data:` URL for chat-style vision APIs.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", Self::MIME_TYPE, self.base64)
    }
}

/// Prepares images for recognition.
#[derive(Debug, Clone, Copy)]
pub struct ImagePreparer {
    max_dimension: u32,
}

impl ImagePreparer {
    /// Create a preparer that bounds the longest edge to `max_dimension` pixels.
    #[must_use]
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Load, bound, and encode the image at `path`.
    pub fn prepare(&self, path: &Path) -> Result<EncodedImage, PrepareError> {
        let img = image::open(path).map_err(|source| PrepareError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        self.encode(path, img)
    }

    fn encode(&self, path: &Path, img: DynamicImage) -> Result<EncodedImage, PrepareError> {
        let mut img = DynamicImage::ImageRgb8(img.to_rgb8());

        let (width, height) = img.dimensions();
        if width.max(height) > self.max_dimension {
            // `resize` keeps the aspect ratio and fits inside the bounding box.
            img = img.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3);
            log::trace!(
                "Downscaled {} from {}x{} to {}x{}",
                path.display(),
                width,
                height,
                img.width(),
                img.height()
            );
        }

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|source| PrepareError::Encode {
                path: path.to_path_buf(),
                source,
            })?;

        if png.len() > MAX_PAYLOAD_BYTES {
            return Err(PrepareError::TooLarge {
                path: path.to_path_buf(),
                size: png.len(),
            });
        }

        Ok(EncodedImage {
            base64: BASE64_STANDARD.encode(&png),
            width: img.width(),
            height: img.height(),
        })
    }
}

impl Default for ImagePreparer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}
