//! Unified diff generation utilities.
//!
//! Provides functions to generate standard unified diff format from edit information.

use std::collections::BTreeMap;

use crate::span::OutputEdit;

/// Generate a unified diff from edit information.
///
/// Groups edits by file and produces standard unified diff format.
/// Each edit is shown as a single-line change at its location.
pub fn generate_unified_diff(edits: &[OutputEdit]) -> String {
    // Group edits by file, keeping deterministic file order
    let mut by_file: BTreeMap<&str, Vec<&OutputEdit>> = BTreeMap::new();
    for edit in edits {
        by_file.entry(&edit.file).or_default().push(edit);
    }

    let mut diff = String::new();
    for (file, file_edits) in by_file {
        diff.push_str(&format!("--- a/{}\n", file));
        diff.push_str(&format!("+++ b/{}\n", file));

        for edit in file_edits {
            diff.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                edit.line, 1, edit.line, 1
            ));
            diff.push_str(&format!("-{}\n", edit.old_text));
            diff.push_str(&format!("+{}\n", edit.new_text));
        }
    }

    diff
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn edit(file: &str, line: u32, old: &str, new: &str) -> OutputEdit {
        OutputEdit {
            file: file.to_string(),
            span: Span::new(0, old.len()),
            old_text: old.to_string(),
            new_text: new.to_string(),
            line,
            col: 1,
        }
    }

    #[test]
    fn generate_diff_single_file_single_edit() {
        let diff = generate_unified_diff(&[edit("test.py", 1, "x = 1", "x: int = 1")]);

        assert!(diff.contains("--- a/test.py"));
        assert!(diff.contains("+++ b/test.py"));
        assert!(diff.contains("-x = 1"));
        assert!(diff.contains("+x: int = 1"));
    }

    #[test]
    fn generate_diff_multiple_files_are_ordered() {
        let diff = generate_unified_diff(&[
            edit("b.py", 1, "y", "y: int"),
            edit("a.py", 1, "x", "x: int"),
        ]);

        let a_pos = diff.find("--- a/a.py").unwrap();
        let b_pos = diff.find("--- a/b.py").unwrap();
        assert!(a_pos < b_pos, "files should appear in sorted order");
    }

    #[test]
    fn generate_diff_empty() {
        assert_eq!(generate_unified_diff(&[]), "");
    }
}
