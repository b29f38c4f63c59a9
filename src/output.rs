//! JSON output types and serialization for CLI responses.
//!
//! The envelope carries a status, an ISO-8601 UTC timestamp, the per-file
//! annotation reports (edits, skipped targets, content hashes), and any
//! per-file failures. Rewritten file contents never appear in the JSON;
//! consumers use `--write` or the unified diff instead.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use hinttool_core::diff::generate_unified_diff;
use hinttool_core::error::{HintError, OutputErrorCode};
use hinttool_python::AnnotateBatch;

/// Top-level JSON report for the annotate command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateReport {
    /// `"ok"` or `"error"`.
    pub status: String,
    /// ISO-8601 UTC timestamp of the run.
    pub timestamp: String,
    /// `"check"` or `"write"`.
    pub mode: String,
    /// Total edits across all files.
    pub total_edits: usize,
    /// Files written to disk (always 0 in check mode).
    pub files_written: usize,
    #[serde(flatten)]
    pub batch: AnnotateBatch,
}

impl AnnotateReport {
    /// Build a success report from a batch result.
    pub fn from_batch(batch: AnnotateBatch, write: bool, files_written: usize) -> Self {
        AnnotateReport {
            status: "ok".to_string(),
            timestamp: timestamp(),
            mode: if write { "write" } else { "check" }.to_string(),
            total_edits: batch.edit_count(),
            files_written,
            batch,
        }
    }
}

/// JSON error payload with the stable error code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub status: String,
    pub timestamp: String,
    pub code: u8,
    pub error: String,
}

impl ErrorReport {
    pub fn from_error(err: &HintError) -> Self {
        ErrorReport {
            status: "error".to_string(),
            timestamp: timestamp(),
            code: OutputErrorCode::from(err).code(),
            error: err.to_string(),
        }
    }
}

/// Current time as ISO-8601 UTC with second precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serialize a report to pretty JSON; serialization itself cannot fail for
/// these types, but any failure is still surfaced as a JSON error object.
pub fn render_json<T: Serialize>(report: &T) -> String {
    serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!("{{\"status\":\"error\",\"error\":\"{}\"}}", e))
}

/// Render the batch's edits as a unified diff.
pub fn render_diff(batch: &AnnotateBatch) -> String {
    let edits: Vec<_> = batch
        .files
        .iter()
        .flat_map(|f| f.edits.iter().cloned())
        .collect();
    generate_unified_diff(&edits)
}

/// One-line-per-file human summary.
pub fn render_summary(batch: &AnnotateBatch, write: bool) -> String {
    let mut out = String::new();
    for file in &batch.files {
        if !file.changed {
            continue;
        }
        out.push_str(&format!(
            "{}: {} variable(s), {} function(s), {} edit(s){}\n",
            file.file,
            file.variables_annotated,
            file.functions_annotated,
            file.edits.len(),
            if write { " [written]" } else { "" },
        ));
        for skipped in &file.skipped {
            out.push_str(&format!(
                "  skipped {} at {}:{}: {}\n",
                skipped.name, skipped.line, skipped.col, skipped.reason
            ));
        }
    }
    for failure in &batch.failures {
        out.push_str(&format!("{}: FAILED: {}\n", failure.file, failure.error));
    }
    if batch.is_clean() && batch.failures.is_empty() {
        out.push_str("nothing to annotate\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hinttool_python::{annotate_files, AnnotateOptions};

    fn sample_batch() -> AnnotateBatch {
        let files = vec![("m.py".to_string(), "x = 1\n".to_string())];
        annotate_files(&files, &AnnotateOptions::default())
    }

    #[test]
    fn report_serializes_with_envelope_fields() {
        let report = AnnotateReport::from_batch(sample_batch(), false, 0);
        let json = render_json(&report);
        assert!(json.contains("\"status\": \"ok\""));
        assert!(json.contains("\"mode\": \"check\""));
        assert!(json.contains("\"timestamp\""));
        assert!(json.contains("\"files\""));
        assert!(json.contains("\"content_hash\""));
        assert!(!json.contains("new_source"), "rewritten source must not leak");
    }

    #[test]
    fn diff_contains_edit_lines() {
        let diff = render_diff(&sample_batch());
        assert!(diff.contains("--- a/m.py"));
        assert!(diff.contains("-x = 1"));
        assert!(diff.contains("+x: Any = 1"));
    }

    #[test]
    fn summary_lists_changed_files() {
        let summary = render_summary(&sample_batch(), false);
        assert!(summary.contains("m.py: 1 variable(s)"));
    }

    #[test]
    fn summary_reports_clean_batch() {
        let files = vec![("m.py".to_string(), "x: int = 1\n".to_string())];
        let batch = annotate_files(&files, &AnnotateOptions::default());
        let summary = render_summary(&batch, false);
        assert!(summary.contains("nothing to annotate"));
    }

    #[test]
    fn error_report_carries_code() {
        let err = HintError::file_not_found("missing.py");
        let report = ErrorReport::from_error(&err);
        assert_eq!(report.code, 3);
        let json = render_json(&report);
        assert!(json.contains("missing.py"));
    }
}
