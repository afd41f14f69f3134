//! Editor-to-server routing rules.
//!
//! Requests against tracked cells are rewritten into virtual-document
//! coordinates and recorded for response correlation; notebook lifecycle
//! notifications mutate the registry and synthesize the `textDocument/*`
//! messages the wrapped server actually understands.

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::Result;
use crate::notebook::sync::{
    DidChangeNotebookParams, DidCloseNotebookParams, DidOpenNotebookParams,
};
use crate::router::Router;
use crate::router::translate::{shift_position_value, shift_range_value};
use crate::rpc::RequestId;

/// Requests whose params carry a cell URI plus a position or range that
/// must move into virtual-document coordinates.
const REWRITE_METHODS: &[&str] = &[
    "textDocument/codeAction",
    "textDocument/inlayHint",
    "textDocument/semanticTokens/range",
    "textDocument/foldingRange",
    "textDocument/codeLens",
    "textDocument/semanticTokens/full",
    "textDocument/formatting",
    "textDocument/hover",
    "textDocument/implementation",
    "textDocument/definition",
    "textDocument/completion",
];

impl Router {
    /// Handle a request from the editor.
    ///
    /// The pending entry records the params exactly as the editor sent
    /// them, for every request: a response can only be translated with
    /// its original cell context. `shutdown` is forwarded like any other
    /// request; the session ends only when its response comes back.
    pub(super) fn editor_request(&mut self, id: RequestId, method: &str, mut raw: Value) -> Vec<Value> {
        let params_snapshot = raw.get("params").cloned().unwrap_or(Value::Null);

        if REWRITE_METHODS.contains(&method) {
            self.rewrite_cell_request(&mut raw);
        }

        self.pending.insert(id, method.to_string(), params_snapshot);
        vec![raw]
    }

    /// Move a cell-addressed request into virtual-document coordinates.
    ///
    /// Untracked URIs leave the request untouched; bookkeeping gaps must
    /// not block protocol flow.
    fn rewrite_cell_request(&self, raw: &mut Value) {
        let Some(cell_uri) = raw
            .pointer("/params/textDocument/uri")
            .and_then(Value::as_str)
            .map(String::from)
        else {
            return;
        };
        let Some(notebook) = self.registry.notebook_by_cell(&cell_uri) else {
            return;
        };
        let Some(offset) = notebook.offset_of(&cell_uri) else {
            return;
        };
        let notebook_uri = notebook.uri.clone();

        if let Some(position) = raw.pointer_mut("/params/position") {
            shift_position_value(position, i64::from(offset));
        }
        if let Some(range) = raw.pointer_mut("/params/range") {
            shift_range_value(range, i64::from(offset));
        }
        if let Some(uri_slot) = raw.pointer_mut("/params/textDocument/uri") {
            *uri_slot = Value::String(notebook_uri);
        }
    }

    /// Handle a notification from the editor.
    ///
    /// # Errors
    ///
    /// Propagates a malformed-edit failure from the text patcher; any
    /// other irregularity degrades to pass-through or a logged drop.
    pub(super) fn editor_notification(&mut self, method: &str, raw: Value) -> Result<Vec<Value>> {
        match method {
            "notebookDocument/didOpen" => Ok(self.notebook_did_open(raw)),
            "notebookDocument/didClose" => Ok(self.notebook_did_close(raw)),
            "notebookDocument/didChange" => self.notebook_did_change(raw),
            "$/cancelRequest" => {
                // Only local bookkeeping: drop the pending entry so a late
                // response is not mis-rewritten, then let the server see
                // the cancel and own the actual cancellation.
                if let Some(id) = raw
                    .pointer("/params/id")
                    .and_then(RequestId::from_value)
                {
                    self.pending.remove(&id);
                }
                Ok(vec![raw])
            }
            _ => Ok(vec![raw]),
        }
    }

    /// Track a newly opened notebook and open its virtual document on the
    /// server. A duplicate or unparseable open passes through unmodified.
    fn notebook_did_open(&mut self, raw: Value) -> Vec<Value> {
        let params = raw.get("params").cloned().unwrap_or(Value::Null);
        let parsed: DidOpenNotebookParams = match serde_json::from_value(params) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(%error, "unparseable notebookDocument/didOpen, forwarding unchanged");
                return vec![raw];
            }
        };

        if !self.registry.open(&parsed) {
            return vec![raw];
        }

        let Some(notebook) = self.registry.notebook(&parsed.notebook_document.uri) else {
            return vec![raw];
        };
        debug!(notebook = %notebook.uri, cells = notebook.cells.len(), "tracking notebook");

        vec![json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didOpen",
            "params": {
                "textDocument": {
                    "uri": notebook.uri,
                    "languageId": self.options.language_id,
                    "version": notebook.version,
                    "text": notebook.virtual_text(&self.options.comment_prefix),
                }
            }
        })]
    }

    /// Stop tracking a closed notebook and close its virtual document on
    /// the server. An untracked or unparseable close passes through.
    fn notebook_did_close(&mut self, raw: Value) -> Vec<Value> {
        let params = raw.get("params").cloned().unwrap_or(Value::Null);
        let parsed: DidCloseNotebookParams = match serde_json::from_value(params) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(%error, "unparseable notebookDocument/didClose, forwarding unchanged");
                return vec![raw];
            }
        };

        let uri = parsed.notebook_document.uri;
        if !self.registry.close(&uri) {
            return vec![raw];
        }
        debug!(notebook = %uri, "notebook closed");

        vec![json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didClose",
            "params": {"textDocument": {"uri": uri}}
        })]
    }

    /// Apply a notebook change and broadcast the rebuilt virtual document.
    ///
    /// Text and structure sub-changes apply cumulatively; one version bump
    /// and one full-text `didChange` cover both. A notification carrying
    /// neither recognized shape is dropped (logged, not forwarded).
    fn notebook_did_change(&mut self, raw: Value) -> Result<Vec<Value>> {
        let params = raw.get("params").cloned().unwrap_or(Value::Null);
        let parsed: DidChangeNotebookParams = match serde_json::from_value(params) {
            Ok(parsed) => parsed,
            Err(error) => {
                debug!(%error, "unparseable notebookDocument/didChange, dropping");
                return Ok(vec![]);
            }
        };

        let uri = parsed.notebook_document.uri;
        if self.registry.notebook(&uri).is_none() {
            return Ok(vec![raw]);
        }

        let mut applied = false;
        if let Some(cells) = parsed.change.cells {
            if let Some(text_content) = cells.text_content {
                for change in &text_content {
                    applied |= self.registry.patch_cell_text(&uri, change)?;
                }
            }
            if let Some(structure) = cells.structure {
                self.registry.splice_structure(&uri, &structure);
                applied = true;
            }
        }

        if !applied {
            debug!(notebook = %uri, "didChange without a recognized sub-change, dropping");
            return Ok(vec![]);
        }

        let Some(version) = self.registry.bump_version(&uri) else {
            return Ok(vec![]);
        };
        let Some(notebook) = self.registry.notebook(&uri) else {
            return Ok(vec![]);
        };

        Ok(vec![json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didChange",
            "params": {
                "textDocument": {"uri": uri, "version": version},
                "contentChanges": [
                    {"text": notebook.virtual_text(&self.options.comment_prefix)}
                ]
            }
        })])
    }
}
