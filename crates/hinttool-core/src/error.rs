//! Error types and error code constants for hint.
//!
//! This module provides a unified error type (`HintError`) that bridges
//! domain-specific errors from different subsystems (parsing, annotation,
//! file collection) into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! Exit codes:
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, parse failure)
//! - `4`: Apply errors (failed to apply or write changes)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! ## Design
//!
//! - **Unified type**: `HintError` is the single error type for CLI output
//! - **Bridging**: `impl From<X> for HintError` bridges domain errors
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes for JSON

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file not found, parse failure).
    ResolutionError = 3,
    /// Apply errors (failed to write changes, conflicting edits).
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// This is the canonical error type that all subsystem errors are converted to
/// before being rendered as JSON output. Each variant includes enough context
/// to produce a helpful error message and optional `details` field.
#[derive(Debug, Error)]
pub enum HintError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Source failed to parse.
    #[error("parse error in {file}: {message}")]
    ParseFailed { file: String, message: String },

    /// Failed to apply changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&HintError> for OutputErrorCode {
    fn from(err: &HintError) -> Self {
        match err {
            HintError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            HintError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            HintError::ParseFailed { .. } => OutputErrorCode::ResolutionError,
            HintError::ApplyError { .. } => OutputErrorCode::ApplyError,
            HintError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<HintError> for OutputErrorCode {
    fn from(err: HintError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl HintError {
    /// Create an invalid arguments error with optional details.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        HintError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        HintError::FileNotFound { path: path.into() }
    }

    /// Create a parse failure error.
    pub fn parse_failed(file: impl Into<String>, message: impl Into<String>) -> Self {
        HintError::ParseFailed {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        HintError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn invalid_arguments_maps_to_invalid_arguments() {
            let err = HintError::invalid_args("missing required field");
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn file_not_found_maps_to_resolution_error() {
            let err = HintError::file_not_found("missing.py");
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn parse_failed_maps_to_resolution_error() {
            let err = HintError::parse_failed("bad.py", "unexpected token");
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn apply_error_maps_to_apply_error() {
            let err = HintError::ApplyError {
                message: "overlapping edits".to_string(),
                file: Some("test.py".to_string()),
            };
            assert_eq!(err.error_code().code(), 4);
        }

        #[test]
        fn internal_error_maps_to_internal_error() {
            let err = HintError::internal("unexpected state");
            assert_eq!(err.error_code().code(), 10);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn file_not_found_display() {
            let err = HintError::file_not_found("missing.py");
            assert_eq!(err.to_string(), "file not found: missing.py");
        }

        #[test]
        fn parse_failed_display() {
            let err = HintError::parse_failed("bad.py", "unexpected indent");
            assert_eq!(err.to_string(), "parse error in bad.py: unexpected indent");
        }
    }

    mod output_error_code {
        use super::*;

        #[test]
        fn code_values_are_stable() {
            assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
            assert_eq!(OutputErrorCode::ResolutionError.code(), 3);
            assert_eq!(OutputErrorCode::ApplyError.code(), 4);
            assert_eq!(OutputErrorCode::InternalError.code(), 10);
        }

        #[test]
        fn display_shows_code() {
            assert_eq!(format!("{}", OutputErrorCode::InternalError), "10");
        }
    }
}
