//! Consensus extraction: several differently worded requests per image.
//!
//! Each instruction looks at the image from another angle. Distinct answers
//! are kept in first-seen order and joined with [`CONSENSUS_SEPARATOR`]. If
//! no request produces text, the single-pass result is used instead.

use std::path::Path;
use std::thread;

use super::TextExtractor;
use crate::cache::CacheKey;
use crate::error::ExtractError;
use crate::scanner::Fingerprint;
use crate::text::ExtractedText;

/// Separator placed between distinct consensus answers.
pub const CONSENSUS_SEPARATOR: &str = " | ";

/// Instructions sent for consensus extraction, in order.
pub const CONSENSUS_INSTRUCTIONS: [&str; 3] = [
    "Read every piece of text visible in this image and reply with the text only. \
     If there is no text, reply with an empty string.",
    "Look closely for small or peripheral text in this image, such as website domains, \
     taglines, slogans, or fine print. Reply with that text only, or an empty string if \
     there is none.",
    "Identify any brand name or text that forms part of the logo in this image. Reply with \
     the brand text only, or an empty string if there is none.",
];

/// Merge sanitized answers: drop empties and exact duplicates, keep order.
#[must_use]
pub fn merge_answers<I>(answers: I) -> ExtractedText
where
    I: IntoIterator<Item = ExtractedText>,
{
    let mut distinct: Vec<String> = Vec::new();
    for answer in answers {
        if let ExtractedText::Text(text) = answer {
            if !distinct.contains(&text) {
                distinct.push(text);
            }
        }
    }

    if distinct.is_empty() {
        ExtractedText::NoText
    } else {
        ExtractedText::Text(distinct.join(CONSENSUS_SEPARATOR))
    }
}

impl TextExtractor {
    /// Extract text from one image using several requests for higher recall.
    ///
    /// Results are cached under the comprehensive key, separate from
    /// [`TextExtractor::extract_text`]. A failed sub-request is logged and
    /// skipped. When no sub-request yields text, the single-pass result is
    /// returned; it is cached under the comprehensive key only if every
    /// sub-request actually answered, so a flaky service gets another try.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Prepare`] if the image cannot be decoded or encoded
    /// - Any error from the single-pass fallback
    pub fn extract_text_comprehensive(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<ExtractedText, ExtractError> {
        let path = path.as_ref();
        let key = CacheKey::Comprehensive(Fingerprint::of_file(path));
        if let Some(text) = self.lookup(&key) {
            return Ok(text);
        }

        let image = self.prepare(path)?;

        let mut answers = Vec::with_capacity(CONSENSUS_INSTRUCTIONS.len());
        let mut failures = 0usize;
        for (idx, instruction) in CONSENSUS_INSTRUCTIONS.iter().enumerate() {
            if idx > 0 && !self.config.consensus_pause.is_zero() {
                thread::sleep(self.config.consensus_pause);
            }
            match self.recognize(path, &image, instruction) {
                Ok(answer) => answers.push(answer),
                Err(e) => {
                    failures += 1;
                    log::warn!(
                        "Consensus request {}/{} skipped: {}",
                        idx + 1,
                        CONSENSUS_INSTRUCTIONS.len(),
                        e
                    );
                }
            }
        }

        let merged = merge_answers(answers);
        if !merged.is_empty() {
            log::debug!("Consensus for {}: {}", path.display(), merged);
            return Ok(self.store(&key, merged));
        }

        log::debug!(
            "No consensus text for {}, falling back to single pass",
            path.display()
        );
        let (fallback, _) = self.extract_single(path)?;
        if failures == 0 {
            Ok(self.store(&key, fallback))
        } else {
            Ok(fallback)
        }
    }
}
