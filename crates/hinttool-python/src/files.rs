//! Python file collection utilities.
//!
//! Provides workspace file discovery for the annotation operation. Files in
//! library locations (`site-packages`, `dist-packages`) are classified as
//! read-only sources and never annotated.

use std::fs;
use std::io;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;
use walkdir::WalkDir;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// File not found.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// Invalid exclusion pattern.
    #[error("invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

// ============================================================================
// File Classification
// ============================================================================

/// Directories never descended into.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "venv",
    ".venv",
    ".tox",
    ".mypy_cache",
    "node_modules",
    "build",
    "dist",
];

/// True when a path points into library (read-only) sources.
///
/// The standalone analogue of the host IDE's library-classes check: anything
/// under an installed-packages directory is never a mutation target.
pub fn is_library_path(path: &Path) -> bool {
    path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        name == "site-packages" || name == "dist-packages"
    })
}

fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name) || (name.starts_with('.') && name.len() > 1)
}

/// Build a glob set from user-supplied exclusion patterns.
pub fn build_exclude_set(patterns: &[String]) -> FileResult<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| FileError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| FileError::Pattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })?;
    Ok(Some(set))
}

// ============================================================================
// File Collection
// ============================================================================

/// Collect Python files by walking a directory.
///
/// Respects standard exclusion patterns (`.git`, `__pycache__`, virtualenvs)
/// and skips library sources. Returns `(relative_path, content)` tuples in
/// deterministic path order.
pub fn collect_python_files(root: &Path) -> FileResult<Vec<(String, String)>> {
    collect_python_files_filtered(root, None)
}

/// Collect Python files with an optional user exclusion glob set.
///
/// Patterns match against root-relative paths, so `tests/**` excludes the
/// whole tests tree.
pub fn collect_python_files_filtered(
    root: &Path,
    exclude: Option<&GlobSet>,
) -> FileResult<Vec<(String, String)>> {
    if !root.exists() {
        return Err(FileError::NotFound {
            path: root.display().to_string(),
        });
    }
    if root.is_file() {
        let content = fs::read_to_string(root)?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        return Ok(vec![(name, content)]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        entry
            .file_name()
            .to_str()
            .map(|name| !is_excluded_dir(name))
            .unwrap_or(true)
    });

    for entry in walker {
        let entry = entry.map_err(|e| FileError::Io(io::Error::other(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        if is_library_path(path) {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative_str = relative.to_string_lossy().replace('\\', "/");
        if let Some(set) = exclude {
            if set.is_match(&relative_str) {
                continue;
            }
        }
        let content = fs::read_to_string(path)?;
        files.push((relative_str, content));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

// ============================================================================
// Tests
// ============================================================================
