//! Single-pass extraction: one request per image.

use std::path::Path;

use super::{Source, TextExtractor};
use crate::cache::CacheKey;
use crate::error::ExtractError;
use crate::scanner::Fingerprint;
use crate::text::ExtractedText;

/// Instruction sent for single-pass extraction.
pub const SINGLE_PASS_INSTRUCTION: &str = "Extract all visible text from this image exactly as \
it appears, including brand names, slogans, and small print. Reply with the text only. If the \
image contains no text, reply with an empty string.";

impl TextExtractor {
    /// Extract text from one image.
    ///
    /// A cached result is returned without touching the network. On a miss
    /// the image is prepared, sent once, and the sanitized answer is cached.
    /// Service errors are returned with the path attached and are not cached.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Prepare`] if the image cannot be decoded or encoded
    /// - [`ExtractError::Recognition`] if the service request fails
    pub fn extract_text(&self, path: impl AsRef<Path>) -> Result<ExtractedText, ExtractError> {
        self.extract_single(path.as_ref()).map(|(text, _)| text)
    }

    pub(crate) fn extract_single(
        &self,
        path: &Path,
    ) -> Result<(ExtractedText, Source), ExtractError> {
        let key = CacheKey::Single(Fingerprint::of_file(path));
        if let Some(text) = self.lookup(&key) {
            return Ok((text, Source::Cached));
        }

        let image = self.prepare(path)?;
        let text = self.recognize(path, &image, SINGLE_PASS_INSTRUCTION)?;
        log::debug!("Extracted {} chars from {}", text.len(), path.display());

        Ok((self.store(&key, text), Source::Fetched))
    }
}
