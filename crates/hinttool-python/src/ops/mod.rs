//! Python annotation operations framework.
//!
//! Provides the shared context for operations plus the annotate operation
//! itself.

pub mod annotate;

use std::path::PathBuf;

use globset::GlobSet;

use crate::files::{collect_python_files, collect_python_files_filtered, FileResult};

pub use annotate::{
    annotate_files, annotate_source, AnnotateBatch, AnnotateError, AnnotateOptions,
    FileAnnotation, FileFailure, OracleKind, SkippedTarget,
};

// ============================================================================
// Operation Context
// ============================================================================

/// Common context for Python operations.
///
/// Holds the workspace root the operation runs against and performs file
/// collection for it.
#[derive(Debug, Clone)]
pub struct PythonOpContext {
    /// Workspace root directory.
    pub workspace_root: PathBuf,
}

impl PythonOpContext {
    /// Create from an explicit workspace root.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        PythonOpContext {
            workspace_root: workspace_root.into(),
        }
    }

    /// Collect Python files from the workspace.
    ///
    /// Walks the workspace directory and returns `(relative_path, content)`
    /// tuples, excluding library sources and standard junk directories.
    pub fn collect_python_files(&self) -> FileResult<Vec<(String, String)>> {
        collect_python_files(&self.workspace_root)
    }

    /// Collect Python files with user exclusion patterns applied.
    pub fn collect_python_files_filtered(
        &self,
        exclude: Option<&GlobSet>,
    ) -> FileResult<Vec<(String, String)>> {
        collect_python_files_filtered(&self.workspace_root, exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_collects_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("m.py"), "x = 1\n").expect("write");
        let ctx = PythonOpContext::new(dir.path());
        let files = ctx.collect_python_files().expect("collect");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "m.py");
    }
}
