//! hinttool: best-effort type annotation insertion for Python sources.
//!
//! A static-analysis/text-rewriting tool that parses Python files, discovers
//! unannotated binding targets and function signatures, consults a type
//! oracle (falling back to `Any`), and splices annotations into the source:
//! inline syntax for modern language levels, `# type:` comments for legacy
//! ones.

// Core infrastructure - re-exported from hinttool-core
pub use hinttool_core::diff;
pub use hinttool_core::error;
pub use hinttool_core::span;
pub use hinttool_core::text;

// Language engine
pub use hinttool_python as python;

// Front doors
pub mod cli;
pub mod output;

// Error bridges - converts operation errors to HintError
mod error_bridges;
pub use error_bridges::to_hint_error;
