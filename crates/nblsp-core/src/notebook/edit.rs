//! Incremental text patching for cell buffers.
//!
//! Applies the editor's `textDocument` content changes to a cell's line
//! array. Two shapes are accepted: a range edit (replace the spanned region
//! with new text) and a rangeless full replace. Anything else is a
//! [`Error::MalformedEdit`]: silently skipping an edit would leave the
//! tracked buffer permanently out of sync with the editor's real buffer.

use lsp_types::{Range, TextDocumentContentChangeEvent};

use crate::error::{Error, Result};
use crate::notebook::document::split_lines;

/// Apply a batch of content changes to a line buffer, in order.
///
/// CRLF sequences in incoming text are normalized to LF before splitting.
/// Line and character indexes outside the current buffer are clamped to the
/// nearest valid boundary; positions are interpreted on `char` boundaries.
///
/// # Errors
///
/// Returns [`Error::MalformedEdit`] for an edit that carries a
/// `rangeLength` but no range; it cannot be located in the buffer.
pub fn apply_edits(lines: &mut Vec<String>, edits: &[TextDocumentContentChangeEvent]) -> Result<()> {
    for edit in edits {
        let text = edit.text.replace("\r\n", "\n");
        match &edit.range {
            Some(range) => apply_range_edit(lines, range, &text),
            None if edit.range_length.is_some() => {
                return Err(Error::MalformedEdit(
                    "change carries rangeLength but no range".to_string(),
                ));
            }
            None => *lines = split_lines(&text),
        }
    }
    Ok(())
}

/// Replace the region between `range.start` and `range.end` with `text`.
///
/// The partial prefix of the start line and the partial suffix of the end
/// line are kept; the joined result is re-split on newlines and spliced
/// back in place of the spanned lines.
fn apply_range_edit(lines: &mut Vec<String>, range: &Range, text: &str) {
    if lines.is_empty() {
        lines.push(String::new());
    }

    let last = lines.len() - 1;
    let start_line = (range.start.line as usize).min(last);
    let end_line = (range.end.line as usize).max(start_line).min(last);

    let prefix = &lines[start_line][..byte_index(&lines[start_line], range.start.character)];
    let suffix = &lines[end_line][byte_index(&lines[end_line], range.end.character)..];

    let merged = format!("{prefix}{text}{suffix}");
    let replacement: Vec<String> = merged.split('\n').map(str::to_owned).collect();

    lines.splice(start_line..=end_line, replacement);
}

/// Byte index of the `character`-th char, clamped to the line end.
fn byte_index(line: &str, character: u32) -> usize {
    line.char_indices()
        .nth(character as usize)
        .map_or(line.len(), |(index, _)| index)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lsp_types::Position;
    use rstest::rstest;

    use super::*;

    fn buffer(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    fn range_edit(
        start: (u32, u32),
        end: (u32, u32),
        text: &str,
    ) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position::new(start.0, start.1),
                end: Position::new(end.0, end.1),
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    fn full_edit(text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_full_replace() {
        let mut lines = buffer(&["old"]);
        apply_edits(&mut lines, &[full_edit("new\ncontent")]).unwrap();
        assert_eq!(lines, buffer(&["new", "content"]));
    }

    #[test]
    fn test_full_replace_with_empty_text() {
        let mut lines = buffer(&["a", "b"]);
        apply_edits(&mut lines, &[full_edit("")]).unwrap();
        assert_eq!(lines, buffer(&[""]));
    }

    #[test]
    fn test_insert_within_line() {
        let mut lines = buffer(&["const =1;"]);
        apply_edits(&mut lines, &[range_edit((0, 6), (0, 6), "a")]).unwrap();
        assert_eq!(lines, buffer(&["const a=1;"]));
    }

    #[test]
    fn test_delete_within_line() {
        let mut lines = buffer(&["const ab=1;"]);
        apply_edits(&mut lines, &[range_edit((0, 6), (0, 8), "")]).unwrap();
        assert_eq!(lines, buffer(&["const =1;"]));
    }

    #[test]
    fn test_multi_line_replace() {
        let mut lines = buffer(&["first", "second", "third"]);
        apply_edits(&mut lines, &[range_edit((0, 2), (2, 2), "X")]).unwrap();
        assert_eq!(lines, buffer(&["fiXird"]));
    }

    #[test]
    fn test_newline_insertion_splits_line() {
        let mut lines = buffer(&["ab"]);
        apply_edits(&mut lines, &[range_edit((0, 1), (0, 1), "\n")]).unwrap();
        assert_eq!(lines, buffer(&["a", "b"]));
    }

    #[test]
    fn test_crlf_normalized_before_split() {
        let mut lines = buffer(&[""]);
        apply_edits(&mut lines, &[range_edit((0, 0), (0, 0), "a\r\nb")]).unwrap();
        assert_eq!(lines, buffer(&["a", "b"]));
    }

    #[test]
    fn test_edits_apply_in_order() {
        let mut lines = buffer(&[""]);
        apply_edits(
            &mut lines,
            &[
                range_edit((0, 0), (0, 0), "hello"),
                range_edit((0, 5), (0, 5), " world"),
            ],
        )
        .unwrap();
        assert_eq!(lines, buffer(&["hello world"]));
    }

    #[test]
    fn test_rangeless_length_is_malformed() {
        let mut lines = buffer(&["keep"]);
        let bad = TextDocumentContentChangeEvent {
            range: None,
            range_length: Some(4),
            text: "x".to_string(),
        };

        let err = apply_edits(&mut lines, &[bad]).unwrap_err();
        assert!(matches!(err, Error::MalformedEdit(_)));
        // The buffer is untouched; the caller tears the session down.
        assert_eq!(lines, buffer(&["keep"]));
    }

    #[rstest]
    #[case((9, 0), (9, 5))] // lines past the end clamp to the last line
    #[case((0, 99), (0, 99))] // characters past the end clamp to line end
    fn test_out_of_bounds_positions_clamp(#[case] start: (u32, u32), #[case] end: (u32, u32)) {
        let mut lines = buffer(&["ab"]);
        apply_edits(&mut lines, &[range_edit(start, end, "!")]).unwrap();
        assert_eq!(lines, buffer(&["ab!"]));
    }

    #[test]
    fn test_edit_on_empty_buffer() {
        let mut lines: Vec<String> = Vec::new();
        apply_edits(&mut lines, &[range_edit((0, 0), (0, 0), "x")]).unwrap();
        assert_eq!(lines, buffer(&["x"]));
    }

    #[test]
    fn test_multibyte_characters_use_char_offsets() {
        let mut lines = buffer(&["héllo"]);
        apply_edits(&mut lines, &[range_edit((0, 1), (0, 2), "e")]).unwrap();
        assert_eq!(lines, buffer(&["hello"]));
    }
}
