//! Extracted text model and normalization.
//!
//! * [`ExtractedText`]: the outcome of a successful recognition, either text or
//!   an explicit "no text present" answer.
//! * [`sanitize`]: cleanup of raw service answers into an [`ExtractedText`].

pub mod sanitize;

use std::fmt;

pub use sanitize::{sanitize, sanitize_str, LEAD_IN_PHRASES, PLACEHOLDERS};

/// Result of a successful recognition.
///
/// `NoText` means the service looked and found nothing; it is a valid,
/// cacheable answer. "Not yet attempted" is represented by the absence of a
/// cache entry and "could not determine" by an error, never by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExtractedText {
    /// Recognition succeeded and the image carries no readable text.
    NoText,
    /// Recognized text, trimmed and never empty.
    Text(String),
}

impl ExtractedText {
    /// Text view; empty for [`ExtractedText::NoText`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoText => "",
            Self::Text(s) => s,
        }
    }

    /// Whether this is the "no text" answer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoText)
    }

    /// Rebuild from the durable cache representation, where `""` encodes `NoText`.
    #[must_use]
    pub fn from_stored(stored: String) -> Self {
        if stored.trim().is_empty() {
            Self::NoText
        } else {
            Self::Text(stored)
        }
    }

    /// Durable cache representation.
    #[must_use]
    pub fn to_stored(&self) -> String {
        self.as_str().to_string()
    }

    /// Approximate in-memory footprint in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Consume into an optional string.
    #[must_use]
    pub fn into_option(self) -> Option<String> {
        match self {
            Self::NoText => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
