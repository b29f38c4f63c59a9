//! Bridges operation errors into the unified [`HintError`] type.
//!
//! The CLI reports every failure through `HintError` so exit codes and JSON
//! error payloads stay stable regardless of which subsystem failed.

use hinttool_core::error::HintError;
use hinttool_python::{AnnotateError, FileError};

/// Convert an annotate-operation error into the unified CLI error.
pub fn to_hint_error(err: AnnotateError) -> HintError {
    match err {
        AnnotateError::Parse { file, message } => HintError::parse_failed(file, message),
        AnnotateError::Apply { file, message } => HintError::ApplyError {
            message,
            file: Some(file),
        },
        AnnotateError::File(file_err) => file_error_to_hint(file_err),
    }
}

/// Convert a file-collection error into the unified CLI error.
pub fn file_error_to_hint(err: FileError) -> HintError {
    match err {
        FileError::NotFound { path } => HintError::file_not_found(path),
        FileError::Pattern { pattern, message } => {
            HintError::invalid_args(format!("invalid glob pattern '{}': {}", pattern, message))
        }
        FileError::Io(io_err) => HintError::internal(format!("IO error: {}", io_err)),
    }
}
