//! Extraction errors, exit codes, and structured error reports.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::recognition::RecognitionError;
use crate::scanner::PrepareError;

/// Errors that can occur while extracting text from one image.
///
/// Every variant carries the offending path so a batch can report
/// failures without extra bookkeeping.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The image could not be decoded, resized, or encoded.
    #[error("Failed to prepare {path}: {source}")]
    Prepare {
        /// The image that failed
        path: PathBuf,
        /// The underlying preparation error
        #[source]
        source: PrepareError,
    },

    /// The recognition service failed for this image.
    #[error("Recognition failed for {path}: {source}")]
    Recognition {
        /// The image that failed
        path: PathBuf,
        /// The underlying service error
        #[source]
        source: RecognitionError,
    },
}

impl ExtractError {
    /// The file this error concerns.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Prepare { path, .. } | Self::Recognition { path, .. } => path,
        }
    }

    /// Whether retrying the same file later could succeed.
    ///
    /// Service failures are transient; a file that cannot be decoded will
    /// fail the same way next time.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Recognition { .. })
    }
}

/// Exit codes for the logotext binary.
///
/// - 0: Success
/// - 1: General error (unexpected failure)
/// - 3: Partial success (some images in a batch failed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: every requested image was processed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Partial success: the batch completed but some images failed.
    PartialSuccess = 3,
    /// Interrupted: the batch was stopped by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "LT000",
            Self::GeneralError => "LT001",
            Self::PartialSuccess => "LT003",
            Self::Interrupted => "LT130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "LT001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
