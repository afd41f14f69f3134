//! Notebook and cell document state.
//!
//! A [`Notebook`] is an ordered sequence of [`CellDocument`]s under one
//! owning URI. The virtual document the language server sees is never
//! stored; it is derived from the current cell sequence on demand, as are
//! per-cell line offsets: structural edits shift the offsets of every
//! later cell, so caching either would go stale.

use serde::{Deserialize, Serialize};

/// Kind of a notebook cell, as carried on the wire (1 = markup, 2 = code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CellKind {
    /// A markup (documentation) cell; commented out in the virtual document.
    Markup,
    /// A code cell; emitted verbatim in the virtual document.
    Code,
}

impl TryFrom<u8> for CellKind {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Markup),
            2 => Ok(Self::Code),
            other => Err(format!("unknown notebook cell kind: {other}")),
        }
    }
}

impl From<CellKind> for u8 {
    fn from(kind: CellKind) -> Self {
        match kind {
            CellKind::Markup => 1,
            CellKind::Code => 2,
        }
    }
}

/// One cell of a tracked notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellDocument {
    /// The cell's own text-document URI.
    pub uri: String,
    /// Whether the cell holds code or markup.
    pub kind: CellKind,
    /// Cell text as lines, without trailing newline characters.
    pub lines: Vec<String>,
}

impl CellDocument {
    /// Build a cell from its wire text. An empty text still yields one
    /// (empty) line, matching how editors count lines.
    #[must_use]
    pub fn new(uri: String, kind: CellKind, text: &str) -> Self {
        Self {
            uri,
            kind,
            lines: split_lines(text),
        }
    }

    /// Number of lines the cell occupies in the virtual document.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        u32::try_from(self.lines.len()).unwrap_or(u32::MAX)
    }
}

/// Split text into lines, normalizing CRLF to LF first.
#[must_use]
pub fn split_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(str::to_owned)
        .collect()
}

/// A tracked notebook document.
#[derive(Debug, Clone)]
pub struct Notebook {
    /// The notebook's owning URI; the virtual document is addressed by it.
    pub uri: String,
    /// Monotonically increasing version, bumped on every applied change.
    pub version: i64,
    /// Cells in notebook order.
    pub cells: Vec<CellDocument>,
}

impl Notebook {
    /// Render the virtual document: code cells verbatim, markup cells with
    /// every line prefixed by `comment_prefix`, blocks joined by newline in
    /// cell order.
    #[must_use]
    pub fn virtual_text(&self, comment_prefix: &str) -> String {
        self.cells
            .iter()
            .map(|cell| match cell.kind {
                CellKind::Code => cell.lines.join("\n"),
                CellKind::Markup => cell
                    .lines
                    .iter()
                    .map(|line| format!("{comment_prefix}{line}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Line offset of a cell inside the virtual document: the sum of line
    /// counts of all preceding cells. `None` if the cell is not a member.
    #[must_use]
    pub fn offset_of(&self, cell_uri: &str) -> Option<u32> {
        let mut offset: u32 = 0;
        for cell in &self.cells {
            if cell.uri == cell_uri {
                return Some(offset);
            }
            offset += cell.line_count();
        }
        None
    }

    /// Look up a cell by URI.
    #[must_use]
    pub fn cell(&self, cell_uri: &str) -> Option<&CellDocument> {
        self.cells.iter().find(|c| c.uri == cell_uri)
    }

    /// Look up a cell by URI, mutably.
    pub fn cell_mut(&mut self, cell_uri: &str) -> Option<&mut CellDocument> {
        self.cells.iter_mut().find(|c| c.uri == cell_uri)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn code_cell(uri: &str, text: &str) -> CellDocument {
        CellDocument::new(uri.to_string(), CellKind::Code, text)
    }

    fn notebook(cells: Vec<CellDocument>) -> Notebook {
        Notebook {
            uri: "file:///nb.nbts".to_string(),
            version: 1,
            cells,
        }
    }

    #[test]
    fn test_cell_kind_wire_values() {
        assert_eq!(CellKind::try_from(1).unwrap(), CellKind::Markup);
        assert_eq!(CellKind::try_from(2).unwrap(), CellKind::Code);
        assert!(CellKind::try_from(3).is_err());
        assert_eq!(u8::from(CellKind::Code), 2);
    }

    #[test]
    fn test_cell_kind_deserializes_from_json_number() {
        let kind: CellKind = serde_json::from_str("2").unwrap();
        assert_eq!(kind, CellKind::Code);
    }

    #[test]
    fn test_split_lines_empty_text_is_one_line() {
        assert_eq!(split_lines(""), vec![String::new()]);
    }

    #[test]
    fn test_split_lines_normalizes_crlf() {
        assert_eq!(split_lines("a\r\nb\nc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_virtual_text_two_code_cells() {
        let nb = notebook(vec![
            code_cell("cell:1", "const a=1;"),
            code_cell("cell:2", "console.log(a);"),
        ]);

        assert_eq!(nb.virtual_text("//"), "const a=1;\nconsole.log(a);");
    }

    #[test]
    fn test_virtual_text_comments_markup_cells() {
        let nb = notebook(vec![
            CellDocument::new("cell:1".to_string(), CellKind::Markup, "# Title\nintro"),
            code_cell("cell:2", "let x = 0;"),
        ]);

        assert_eq!(nb.virtual_text("//"), "//# Title\n//intro\nlet x = 0;");
    }

    #[test]
    fn test_offset_of_first_cell_is_zero() {
        let nb = notebook(vec![code_cell("cell:1", "a\nb"), code_cell("cell:2", "c")]);
        assert_eq!(nb.offset_of("cell:1"), Some(0));
    }

    #[test]
    fn test_offset_of_is_prefix_sum_of_line_counts() {
        let nb = notebook(vec![
            code_cell("cell:1", "a\nb\nc"),
            CellDocument::new("cell:2".to_string(), CellKind::Markup, "doc"),
            code_cell("cell:3", "d"),
        ]);

        assert_eq!(nb.offset_of("cell:2"), Some(3));
        assert_eq!(nb.offset_of("cell:3"), Some(4));
    }

    #[test]
    fn test_offset_of_unknown_cell_is_none() {
        let nb = notebook(vec![code_cell("cell:1", "a")]);
        assert_eq!(nb.offset_of("cell:9"), None);
    }

    #[test]
    fn test_offsets_track_structural_changes() {
        let mut nb = notebook(vec![
            code_cell("cell:1", "a\nb"),
            code_cell("cell:2", "c"),
        ]);
        assert_eq!(nb.offset_of("cell:2"), Some(2));

        // Removing the first cell shifts later offsets down by its line count.
        nb.cells.remove(0);
        assert_eq!(nb.offset_of("cell:2"), Some(0));
    }

    #[test]
    fn test_cell_lookup() {
        let mut nb = notebook(vec![code_cell("cell:1", "a")]);
        assert!(nb.cell("cell:1").is_some());
        assert!(nb.cell("cell:2").is_none());

        nb.cell_mut("cell:1").unwrap().lines.push("b".to_string());
        assert_eq!(nb.cell("cell:1").unwrap().line_count(), 2);
    }
}
