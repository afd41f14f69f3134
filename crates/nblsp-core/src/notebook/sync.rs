//! Wire payloads for notebook document synchronization.
//!
//! These are the LSP 3.17 `notebookDocument/*` notification parameter
//! shapes, declared locally with URIs kept as plain strings: the proxy
//! only uses them as registry keys and echoes them back verbatim.
//! Payloads that fail to parse degrade to pass-through at the router.

use lsp_types::TextDocumentContentChangeEvent;
use serde::Deserialize;

use crate::notebook::document::CellKind;

/// Parameters of `notebookDocument/didOpen`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidOpenNotebookParams {
    /// The notebook being opened.
    pub notebook_document: NotebookDocumentItem,
    /// Initial text documents for the notebook's cells.
    #[serde(default)]
    pub cell_text_documents: Vec<CellTextItem>,
}

/// A notebook document as sent by the editor on open.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookDocumentItem {
    /// The notebook's owning URI.
    pub uri: String,
    /// Notebook version at open time.
    #[serde(default = "initial_version")]
    pub version: i64,
    /// Cell descriptors in notebook order.
    #[serde(default)]
    pub cells: Vec<CellDescriptor>,
}

/// A cell descriptor: kind plus the URI of the cell's text document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDescriptor {
    /// Code or markup.
    pub kind: CellKind,
    /// URI of the cell's text document.
    pub document: String,
}

/// A cell's text document content, as carried by open payloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellTextItem {
    /// URI of the cell's text document.
    pub uri: String,
    /// Full cell text.
    #[serde(default)]
    pub text: String,
}

/// Parameters of `notebookDocument/didClose`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidCloseNotebookParams {
    /// Identifier of the notebook being closed.
    pub notebook_document: NotebookIdentifier,
}

/// A bare notebook identifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookIdentifier {
    /// The notebook's owning URI.
    pub uri: String,
}

/// Parameters of `notebookDocument/didChange`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidChangeNotebookParams {
    /// Identifier of the changed notebook.
    pub notebook_document: NotebookIdentifier,
    /// The change itself.
    #[serde(default)]
    pub change: NotebookChange,
}

/// The change carried by a `didChange` notification.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookChange {
    /// Cell-level changes, if any.
    #[serde(default)]
    pub cells: Option<CellChanges>,
}

/// Cell-level changes: structure splices and/or per-cell text edits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellChanges {
    /// Structural change to the cell sequence.
    #[serde(default)]
    pub structure: Option<StructureChange>,
    /// Text content changes for individual cells.
    #[serde(default)]
    pub text_content: Option<Vec<CellTextChange>>,
}

/// A structural change: a splice over the cell array plus the open/close
/// payloads for the cells entering and leaving the notebook.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureChange {
    /// The splice to apply to the cell sequence.
    pub array: CellArraySplice,
    /// Initial text documents for inserted cells.
    #[serde(default)]
    pub did_open: Option<Vec<CellTextItem>>,
    /// Identifiers of removed cell documents.
    #[serde(default)]
    pub did_close: Option<Vec<DocumentIdentifier>>,
}

/// Splice parameters over the cell array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellArraySplice {
    /// First affected cell index.
    pub start: u32,
    /// Number of cells removed at `start`.
    pub delete_count: u32,
    /// Descriptors of the inserted cells, if any.
    #[serde(default)]
    pub cells: Option<Vec<CellDescriptor>>,
}

/// Text content change for one cell.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellTextChange {
    /// The cell document the changes apply to.
    pub document: DocumentIdentifier,
    /// The edits, in application order.
    #[serde(default)]
    pub changes: Vec<TextDocumentContentChangeEvent>,
}

/// A bare text document identifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIdentifier {
    /// The document URI.
    pub uri: String,
}

const fn initial_version() -> i64 {
    1
}
