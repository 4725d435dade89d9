//! Diff rendering for conflict review.
//!
//! Pure functions that compare a proposed (in-memory) value against its
//! on-disk counterpart and return an annotated string for the user to
//! inspect before choosing a resolution. Nothing here mutates state or
//! touches the terminal — callers print the result.
//!
//! Annotation conventions:
//! - line-level: each output line is numbered and prefixed `+` (only in the
//!   proposed version), `-` (only on disk), or two spaces (common);
//! - character-level: inserted runs are wrapped `{+…+}` and removed runs
//!   `[-…-]`, with running line numbers;
//! - structural: both documents are pretty-printed and diffed line-wise, so
//!   a changed field shows as a `-`/`+` pair.

use std::fmt::Write as _;

use serde_json::Value;
use similar::{ChangeTag, TextDiff};

/// Character-level diff of `proposed` against `on_disk`, annotated with
/// running line numbers. Either side may be empty.
#[must_use]
pub fn diff_chars(proposed: &str, on_disk: &str) -> String {
    let diff = TextDiff::from_chars(on_disk, proposed);

    let mut line = 1;
    let mut out = format!("{line}: ");
    line += 1;

    for change in diff.iter_all_changes() {
        let (open, close) = match change.tag() {
            ChangeTag::Insert => ("{+", "+}"),
            ChangeTag::Delete => ("[-", "-]"),
            ChangeTag::Equal => ("", ""),
        };
        for c in change.value().chars() {
            if c == '\n' {
                let _ = write!(out, "\n{line}: ");
                line += 1;
            } else {
                let _ = write!(out, "{open}{c}{close}");
            }
        }
    }
    out
}

/// Line-level diff of `proposed` against `on_disk`, numbered per output
/// line.
#[must_use]
pub fn diff_lines(proposed: &str, on_disk: &str) -> String {
    let diff = TextDiff::from_lines(on_disk, proposed);

    let mut out = String::new();
    for (i, change) in diff.iter_all_changes().enumerate() {
        let tag = match change.tag() {
            ChangeTag::Insert => "+ ",
            ChangeTag::Delete => "- ",
            ChangeTag::Equal => "  ",
        };
        let text = change.value();
        let _ = write!(out, "{}:\t{tag}{text}", i + 1);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Structural diff of two parsed documents: both sides are rendered as
/// pretty JSON and compared line-wise, so each differing field or
/// substructure appears as a removed/added pair. Callers sort the documents
/// first so field order never produces spurious differences.
#[must_use]
pub fn diff_json(proposed: &Value, on_disk: &Value) -> String {
    let new = pretty(proposed);
    let old = pretty(on_disk);
    let diff = TextDiff::from_lines(&old, &new);

    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let tag = match change.tag() {
            ChangeTag::Insert => "+ ",
            ChangeTag::Delete => "- ",
            ChangeTag::Equal => "  ",
        };
        let text = change.value();
        out.push_str(tag);
        out.push_str(text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
