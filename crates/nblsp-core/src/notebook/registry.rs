//! Notebook registry: the set of tracked notebooks and the cell-URI index.
//!
//! The registry is the only owner of notebook state. It is mutated
//! exclusively by the notebook lifecycle notifications; every lookup a
//! rewrite needs goes through it. Unknown URIs are never an error; the
//! router degrades to pass-through when a lookup misses.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::notebook::document::{CellDocument, Notebook};
use crate::notebook::edit::apply_edits;
use crate::notebook::sync::{
    CellDescriptor, CellTextChange, CellTextItem, DidOpenNotebookParams, StructureChange,
};

/// Tracks open notebooks and indexes their cells.
#[derive(Debug, Default)]
pub struct NotebookRegistry {
    /// Tracked notebooks by notebook URI.
    notebooks: HashMap<String, Notebook>,
    /// Cell URI to owning notebook URI.
    cell_index: HashMap<String, String>,
}

impl NotebookRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked notebooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notebooks.len()
    }

    /// Whether no notebooks are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notebooks.is_empty()
    }

    /// Track a notebook from a `didOpen` payload.
    ///
    /// Returns `true` if the notebook is new. When the URI is already
    /// tracked, nothing changes and `false` is returned; the caller passes
    /// the original notification through unmodified instead of
    /// re-synthesizing an open.
    pub fn open(&mut self, params: &DidOpenNotebookParams) -> bool {
        let uri = &params.notebook_document.uri;
        if self.notebooks.contains_key(uri) {
            debug!(notebook = %uri, "duplicate didOpen, leaving existing state");
            return false;
        }

        let cells: Vec<CellDocument> = params
            .notebook_document
            .cells
            .iter()
            .map(|descriptor| build_cell(descriptor, Some(params.cell_text_documents.as_slice())))
            .collect();

        for cell in &cells {
            self.cell_index.insert(cell.uri.clone(), uri.clone());
        }

        self.notebooks.insert(
            uri.clone(),
            Notebook {
                uri: uri.clone(),
                version: params.notebook_document.version,
                cells,
            },
        );
        true
    }

    /// Stop tracking a notebook and drop its cell index entries.
    ///
    /// Returns `true` if the notebook was tracked; a miss is a no-op.
    pub fn close(&mut self, uri: &str) -> bool {
        let Some(notebook) = self.notebooks.remove(uri) else {
            return false;
        };
        for cell in &notebook.cells {
            self.cell_index.remove(&cell.uri);
        }
        true
    }

    /// Look up a tracked notebook by its own URI.
    #[must_use]
    pub fn notebook(&self, uri: &str) -> Option<&Notebook> {
        self.notebooks.get(uri)
    }

    /// Look up the notebook owning a cell.
    #[must_use]
    pub fn notebook_by_cell(&self, cell_uri: &str) -> Option<&Notebook> {
        let notebook_uri = self.cell_index.get(cell_uri)?;
        self.notebooks.get(notebook_uri)
    }

    /// Bump and return the version of a tracked notebook.
    pub fn bump_version(&mut self, uri: &str) -> Option<i64> {
        let notebook = self.notebooks.get_mut(uri)?;
        notebook.version += 1;
        Some(notebook.version)
    }

    /// Apply a structural splice to a notebook's cell sequence.
    ///
    /// Cells in `[start, start + delete_count)` are replaced with cells
    /// built from the change's descriptors; inserted cell text comes from
    /// the accompanying `didOpen` payloads (empty when absent). The cell
    /// index is updated for both removed and inserted cells. Out-of-range
    /// splice bounds are clamped. No-op if the notebook is untracked.
    pub fn splice_structure(&mut self, uri: &str, change: &StructureChange) {
        let Some(notebook) = self.notebooks.get_mut(uri) else {
            return;
        };

        let start = (change.array.start as usize).min(notebook.cells.len());
        let end = start + (change.array.delete_count as usize).min(notebook.cells.len() - start);

        let inserted: Vec<CellDocument> = change
            .array
            .cells
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|descriptor| build_cell(descriptor, change.did_open.as_deref()))
            .collect();

        for removed in &notebook.cells[start..end] {
            self.cell_index.remove(&removed.uri);
        }
        for cell in &inserted {
            self.cell_index.insert(cell.uri.clone(), uri.to_string());
        }

        notebook.cells.splice(start..end, inserted);
    }

    /// Apply text content changes to one cell of a notebook.
    ///
    /// Unknown notebook or cell URIs are a no-op; a malformed edit is an
    /// error (the buffer would desync irrecoverably otherwise).
    ///
    /// # Errors
    ///
    /// Propagates [`crate::error::Error::MalformedEdit`] from the patcher.
    pub fn patch_cell_text(&mut self, uri: &str, change: &CellTextChange) -> Result<bool> {
        let Some(cell) = self
            .notebooks
            .get_mut(uri)
            .and_then(|notebook| notebook.cell_mut(&change.document.uri))
        else {
            debug!(cell = %change.document.uri, "text change for unknown cell, skipping");
            return Ok(false);
        };

        apply_edits(&mut cell.lines, &change.changes)?;
        Ok(true)
    }
}

/// Build a cell from its descriptor, sourcing text from matching open
/// payloads when available.
fn build_cell(descriptor: &CellDescriptor, opened: Option<&[CellTextItem]>) -> CellDocument {
    let text = opened
        .and_then(|items| items.iter().find(|item| item.uri == descriptor.document))
        .map_or("", |item| item.text.as_str());
    CellDocument::new(descriptor.document.clone(), descriptor.kind, text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::notebook::document::CellKind;
    use crate::notebook::sync::CellArraySplice;

    fn open_params(uri: &str, cells: &[(&str, u8, &str)]) -> DidOpenNotebookParams {
        serde_json::from_value(json!({
            "notebookDocument": {
                "uri": uri,
                "version": 1,
                "cells": cells
                    .iter()
                    .map(|(doc, kind, _)| json!({"kind": kind, "document": doc}))
                    .collect::<Vec<_>>(),
            },
            "cellTextDocuments": cells
                .iter()
                .map(|(doc, _, text)| json!({"uri": doc, "text": text}))
                .collect::<Vec<_>>(),
        }))
        .unwrap()
    }

    fn two_cell_registry() -> NotebookRegistry {
        let mut registry = NotebookRegistry::new();
        registry.open(&open_params(
            "file:///nb.nbts",
            &[("cell:1", 2, "const a=1;"), ("cell:2", 2, "console.log(a);")],
        ));
        registry
    }

    #[test]
    fn test_open_indexes_cells() {
        let registry = two_cell_registry();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.notebook_by_cell("cell:2").unwrap().uri,
            "file:///nb.nbts"
        );
    }

    #[test]
    fn test_duplicate_open_keeps_existing_state() {
        let mut registry = two_cell_registry();

        let is_new = registry.open(&open_params("file:///nb.nbts", &[("cell:9", 2, "other")]));
        assert!(!is_new);
        // Existing cells survive; the duplicate payload's cells are ignored.
        assert!(registry.notebook_by_cell("cell:1").is_some());
        assert!(registry.notebook_by_cell("cell:9").is_none());
    }

    #[test]
    fn test_close_removes_notebook_and_index() {
        let mut registry = two_cell_registry();
        assert!(registry.close("file:///nb.nbts"));
        assert!(registry.is_empty());
        assert!(registry.notebook_by_cell("cell:1").is_none());
    }

    #[test]
    fn test_close_untracked_is_noop() {
        let mut registry = NotebookRegistry::new();
        assert!(!registry.close("file:///ghost.nbts"));
    }

    #[test]
    fn test_splice_delete_first_cell_shifts_offsets() {
        let mut registry = two_cell_registry();
        let change = StructureChange {
            array: CellArraySplice {
                start: 0,
                delete_count: 1,
                cells: None,
            },
            did_open: None,
            did_close: None,
        };

        registry.splice_structure("file:///nb.nbts", &change);

        let notebook = registry.notebook("file:///nb.nbts").unwrap();
        assert_eq!(notebook.cells.len(), 1);
        assert_eq!(notebook.offset_of("cell:2"), Some(0));
        assert!(registry.notebook_by_cell("cell:1").is_none());
    }

    #[test]
    fn test_splice_insert_with_open_payload() {
        let mut registry = two_cell_registry();
        let change = StructureChange {
            array: CellArraySplice {
                start: 1,
                delete_count: 0,
                cells: Some(vec![CellDescriptor {
                    kind: CellKind::Markup,
                    document: "cell:new".to_string(),
                }]),
            },
            did_open: Some(vec![CellTextItem {
                uri: "cell:new".to_string(),
                text: "# note\nbody".to_string(),
            }]),
            did_close: None,
        };

        registry.splice_structure("file:///nb.nbts", &change);

        let notebook = registry.notebook("file:///nb.nbts").unwrap();
        assert_eq!(notebook.cells.len(), 3);
        assert_eq!(notebook.cells[1].uri, "cell:new");
        assert_eq!(notebook.cells[1].lines, vec!["# note", "body"]);
        assert!(registry.notebook_by_cell("cell:new").is_some());
        // cell:2 moved down past the two inserted lines
        assert_eq!(notebook.offset_of("cell:2"), Some(3));
    }

    #[test]
    fn test_splice_insert_without_open_payload_is_empty_cell() {
        let mut registry = two_cell_registry();
        let change = StructureChange {
            array: CellArraySplice {
                start: 2,
                delete_count: 0,
                cells: Some(vec![CellDescriptor {
                    kind: CellKind::Code,
                    document: "cell:blank".to_string(),
                }]),
            },
            did_open: None,
            did_close: None,
        };

        registry.splice_structure("file:///nb.nbts", &change);

        let notebook = registry.notebook("file:///nb.nbts").unwrap();
        assert_eq!(notebook.cells[2].lines, vec![String::new()]);
    }

    #[test]
    fn test_empty_splice_changes_nothing() {
        let mut registry = two_cell_registry();
        let change = StructureChange {
            array: CellArraySplice {
                start: 1,
                delete_count: 0,
                cells: None,
            },
            did_open: None,
            did_close: None,
        };

        registry.splice_structure("file:///nb.nbts", &change);

        let notebook = registry.notebook("file:///nb.nbts").unwrap();
        assert_eq!(notebook.cells.len(), 2);
        assert!(registry.notebook_by_cell("cell:1").is_some());
        assert!(registry.notebook_by_cell("cell:2").is_some());
    }

    #[test]
    fn test_splice_clamps_out_of_range_bounds() {
        let mut registry = two_cell_registry();
        let change = StructureChange {
            array: CellArraySplice {
                start: 10,
                delete_count: 10,
                cells: None,
            },
            did_open: None,
            did_close: None,
        };

        registry.splice_structure("file:///nb.nbts", &change);
        assert_eq!(registry.notebook("file:///nb.nbts").unwrap().cells.len(), 2);
    }

    #[test]
    fn test_patch_cell_text() {
        let mut registry = two_cell_registry();
        let change: CellTextChange = serde_json::from_value(json!({
            "document": {"uri": "cell:1"},
            "changes": [{"text": "const a=2;"}]
        }))
        .unwrap();

        let applied = registry.patch_cell_text("file:///nb.nbts", &change).unwrap();
        assert!(applied);
        assert_eq!(
            registry
                .notebook("file:///nb.nbts")
                .unwrap()
                .cell("cell:1")
                .unwrap()
                .lines,
            vec!["const a=2;"]
        );
    }

    #[test]
    fn test_patch_unknown_cell_is_noop() {
        let mut registry = two_cell_registry();
        let change: CellTextChange = serde_json::from_value(json!({
            "document": {"uri": "cell:missing"},
            "changes": [{"text": "x"}]
        }))
        .unwrap();

        let applied = registry.patch_cell_text("file:///nb.nbts", &change).unwrap();
        assert!(!applied);
    }

    #[test]
    fn test_bump_version() {
        let mut registry = two_cell_registry();
        assert_eq!(registry.bump_version("file:///nb.nbts"), Some(2));
        assert_eq!(registry.bump_version("file:///nb.nbts"), Some(3));
        assert_eq!(registry.bump_version("file:///ghost"), None);
    }

    #[test]
    fn test_two_registries_are_independent() {
        let mut first = two_cell_registry();
        let second = NotebookRegistry::new();

        first.close("file:///nb.nbts");
        assert!(first.is_empty());
        assert!(second.is_empty());
    }
}
