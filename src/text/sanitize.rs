//! Cleanup of raw recognition answers.
//!
//! Vision models like to wrap their answer in a preamble ("The text in the
//! image reads: ...") or to answer with an empty quote pair when nothing is
//! legible. [`sanitize`] removes the preambles and maps the empty answers to
//! [`ExtractedText::NoText`]. Case and punctuation of the remaining text are
//! preserved.
//!
//! Sanitizing is idempotent: feeding the text of a sanitized answer back in
//! returns the same value.

use super::ExtractedText;

/// Answers that mean "nothing legible".
pub const PLACEHOLDERS: &[&str] = &[
    "\"\"",
    "''",
    "\"\"\"\"",
    "''''",
    "\u{201c}\u{201d}",
    "\u{2018}\u{2019}",
];

/// Lead-in phrases stripped from the start of an answer (ASCII, case-insensitive).
pub const LEAD_IN_PHRASES: &[&str] = &[
    "The text in the image reads:",
    "The text in the image is:",
    "The image contains the text:",
    "The text visible in the image is:",
    "The visible text is:",
    "The text shown is:",
    "The extracted text is:",
    "Text found in image:",
    "Text in image:",
    "Image text:",
    "I can see the text:",
    "Looking at the image, the text says:",
    "Based on the image, the text is:",
    "All visible text from this image:",
    "Extract all text:",
];

/// Sanitize an optional raw answer.
#[must_use]
pub fn sanitize(raw: Option<&str>) -> ExtractedText {
    raw.map_or(ExtractedText::NoText, sanitize_str)
}

/// Sanitize a raw answer.
#[must_use]
pub fn sanitize_str(raw: &str) -> ExtractedText {
    let mut text = raw.trim();
    loop {
        if text.is_empty() || is_placeholder(text) {
            return ExtractedText::NoText;
        }
        match strip_lead_in(text) {
            Some(rest) => text = rest.trim(),
            None => return ExtractedText::Text(text.to_string()),
        }
    }
}

fn is_placeholder(text: &str) -> bool {
    PLACEHOLDERS.contains(&text)
}

fn strip_lead_in(text: &str) -> Option<&str> {
    LEAD_IN_PHRASES.iter().find_map(|phrase| {
        text.get(..phrase.len())
            .filter(|head| head.eq_ignore_ascii_case(phrase))
            .map(|_| &text[phrase.len()..])
    })
}
