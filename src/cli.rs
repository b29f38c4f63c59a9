//! CLI front door for the annotate operation.
//!
//! [`run_annotate`] collects Python files under the requested paths, runs the
//! annotate operation against them, and (in write mode) persists the
//! rewritten sources. Rendering is left to [`crate::output`].
//!
//! ## Error Handling
//!
//! All functions return `Result<T, HintError>`; the `HintError` type provides
//! stable error codes for JSON output and exit statuses.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::info;

use hinttool_core::error::HintError;
use hinttool_python::{
    annotate_files, build_exclude_set, collect_python_files_filtered, AnnotateBatch,
    AnnotateOptions,
};

use crate::error_bridges::file_error_to_hint;

/// A request to annotate a set of paths.
#[derive(Debug, Clone)]
pub struct AnnotateRequest {
    /// Files or directories to annotate.
    pub paths: Vec<PathBuf>,
    /// Apply changes to disk; otherwise check mode (report only).
    pub write: bool,
    /// Operation options (level, oracle, target selection).
    pub options: AnnotateOptions,
    /// Glob patterns excluding files, matched against collected paths.
    pub exclude: Vec<String>,
}

impl AnnotateRequest {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        AnnotateRequest {
            paths,
            write: false,
            options: AnnotateOptions::default(),
            exclude: Vec::new(),
        }
    }
}

/// Outcome of an annotate run.
#[derive(Debug)]
pub struct AnnotateOutcome {
    pub batch: AnnotateBatch,
    /// Files written to disk (0 in check mode).
    pub files_written: usize,
}

/// Collect, annotate, and optionally write back.
pub fn run_annotate(request: &AnnotateRequest) -> Result<AnnotateOutcome, HintError> {
    if request.paths.is_empty() {
        return Err(HintError::invalid_args("no paths given"));
    }
    let exclude = build_exclude_set(&request.exclude).map_err(file_error_to_hint)?;

    // Labels shown in output are path-qualified; absolute targets are kept
    // aside for write-back.
    let mut files: Vec<(String, String)> = Vec::new();
    let mut write_targets: HashMap<String, PathBuf> = HashMap::new();
    for path in &request.paths {
        let collected = collect_python_files_filtered(path, exclude.as_ref())
            .map_err(file_error_to_hint)?;
        let is_file = path.is_file();
        for (relative, content) in collected {
            let (label, target) = if is_file {
                (path.display().to_string(), path.clone())
            } else {
                let target = path.join(&relative);
                (target.display().to_string(), target)
            };
            write_targets.insert(label.clone(), target);
            files.push((label, content));
        }
    }
    info!(files = files.len(), "collected python files");

    let batch = annotate_files(&files, &request.options);

    let mut files_written = 0usize;
    if request.write {
        for file in &batch.files {
            if !file.changed {
                continue;
            }
            let Some(target) = write_targets.get(&file.file) else {
                return Err(HintError::internal(format!(
                    "no write target recorded for {}",
                    file.file
                )));
            };
            fs::write(target, &file.new_source).map_err(|e| HintError::ApplyError {
                message: e.to_string(),
                file: Some(file.file.clone()),
            })?;
            files_written += 1;
        }
        info!(files_written, "wrote annotated files");
    }

    Ok(AnnotateOutcome {
        batch,
        files_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_paths_is_invalid_arguments() {
        let err = run_annotate(&AnnotateRequest::new(Vec::new())).unwrap_err();
        assert_eq!(err.error_code().code(), 2);
    }

    #[test]
    fn missing_path_is_resolution_error() {
        let request = AnnotateRequest::new(vec![PathBuf::from("/nonexistent/xyz")]);
        let err = run_annotate(&request).unwrap_err();
        assert_eq!(err.error_code().code(), 3);
    }

    #[test]
    fn check_mode_leaves_files_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("m.py");
        fs::write(&path, "x = 1\n").expect("write");

        let request = AnnotateRequest::new(vec![dir.path().to_path_buf()]);
        let outcome = run_annotate(&request).expect("run");

        assert_eq!(outcome.files_written, 0);
        assert_eq!(outcome.batch.files.len(), 1);
        assert!(outcome.batch.files[0].changed);
        assert_eq!(fs::read_to_string(&path).expect("read"), "x = 1\n");
    }

    #[test]
    fn write_mode_persists_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("m.py");
        fs::write(&path, "x = 1\n").expect("write");

        let mut request = AnnotateRequest::new(vec![dir.path().to_path_buf()]);
        request.write = true;
        let outcome = run_annotate(&request).expect("run");

        assert_eq!(outcome.files_written, 1);
        let rewritten = fs::read_to_string(&path).expect("read");
        assert!(rewritten.contains("x: Any = 1"));

        // A second run over the written tree is clean.
        let outcome = run_annotate(&request).expect("second run");
        assert_eq!(outcome.files_written, 0);
        assert!(outcome.batch.is_clean());
    }

    #[test]
    fn single_file_path_is_accepted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("one.py");
        fs::write(&path, "x = 1\n").expect("write");

        let request = AnnotateRequest::new(vec![path.clone()]);
        let outcome = run_annotate(&request).expect("run");
        assert_eq!(outcome.batch.files.len(), 1);
        assert_eq!(outcome.batch.files[0].file, path.display().to_string());
    }
}
