//! Python annotation engine for hinttool.
//!
//! This crate turns parsed Python modules into annotated source text:
//!
//! - [`targets`]: discovery of annotatable, not-yet-annotated binding targets
//! - [`oracle`]: the type oracle (stub and literal-level inference)
//! - [`synthesis`]: annotation text and edit construction
//! - [`ops`]: the annotate operation over single files and batches
//! - [`files`]: workspace Python file collection
//! - [`level`]: Python language-level queries

pub mod files;
pub mod level;
pub mod ops;
pub mod oracle;
pub mod synthesis;
pub mod targets;

pub use files::{build_exclude_set, collect_python_files, collect_python_files_filtered, FileError};
pub use level::PythonLevel;
pub use ops::{
    annotate_files, annotate_source, AnnotateBatch, AnnotateError, AnnotateOptions,
    FileAnnotation, FileFailure, OracleKind, PythonOpContext, SkippedTarget,
};
