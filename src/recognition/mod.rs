//! Boundary to the external visual-text-recognition service.
//!
//! The rest of the crate only sees [`RecognitionService`]: send an encoded
//! image plus an instruction, get the raw answer text back or a
//! [`RecognitionError`]. Transport failures and bad statuses are errors; a
//! well-formed answer that happens to contain no text is an `Ok` value and is
//! left to the sanitizer to interpret.
//!
//! * [`http`]: OpenAI-compatible chat-completions client (blocking `reqwest`).

pub mod http;

use thiserror::Error;

use crate::scanner::EncodedImage;

pub use http::{ChatCompletionsClient, HttpClientConfig};

/// Errors reported by a recognition service.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The request did not complete within the configured timeout.
    #[error("Recognition request timed out after {0}s")]
    Timeout(u64),

    /// The request could not be sent or the connection failed.
    #[error("Recognition transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Recognition service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// The response could not be parsed or lacked an answer.
    #[error("Malformed recognition response: {0}")]
    MalformedResponse(String),
}

impl RecognitionError {
    /// HTTP status attached to the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A service that reads text out of images.
///
/// Implementations must be shareable across batch workers. They should apply
/// their own request timeout and must not retry internally; retry policy
/// belongs to the caller.
pub trait RecognitionService: Send + Sync {
    /// Ask the service about `image` using the natural-language `instruction`.
    ///
    /// Returns the raw answer text, which may be empty.
    fn recognize(&self, image: &EncodedImage, instruction: &str)
        -> Result<String, RecognitionError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "recognition"
    }
}
