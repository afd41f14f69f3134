//! Server-to-editor routing rules.
//!
//! Diagnostics for a virtual document fan out into one notification per
//! cell; responses are translated back using the original request recorded
//! in the pending table. Results that cannot be sliced per cell
//! (code actions, full semantic token streams) are emptied rather than
//! partially translated.

use lsp_types::{Diagnostic, FoldingRange, TextEdit};
use serde_json::{Value, json};
use tracing::debug;

use crate::router::pending::PendingRequest;
use crate::router::translate::{local_line, range_to_local, shift_range_value};
use crate::router::{Router, ServerRouting};
use crate::rpc::RequestId;

/// Line span of a cell inside its notebook's virtual document.
struct CellSpan {
    offset: u32,
    line_count: u32,
}

impl Router {
    /// Handle a notification from the server.
    pub(super) fn server_notification(&mut self, method: &str, raw: Value) -> Vec<Value> {
        if method == "textDocument/publishDiagnostics" {
            self.fan_out_diagnostics(raw)
        } else {
            vec![raw]
        }
    }

    /// Handle a response from the server.
    ///
    /// The pending entry is consumed here, exactly once. A response with
    /// no recorded request (already cancelled, or server-initiated
    /// traffic) is forwarded unchanged.
    pub(super) fn server_response(&mut self, id: &RequestId, mut raw: Value) -> ServerRouting {
        let Some(request) = self.pending.take(id) else {
            return ServerRouting::forward(vec![raw]);
        };

        match request.method.as_str() {
            "initialize" => self.inject_notebook_capability(&mut raw),
            "shutdown" => {
                // Relay the response first; the caller tears the session
                // down only after it is on the wire.
                return ServerRouting {
                    outgoing: vec![raw],
                    shutdown_complete: true,
                };
            }
            "textDocument/hover" | "textDocument/implementation" | "textDocument/definition" => {
                self.localize_result_range(&request, &mut raw);
            }
            "textDocument/foldingRange" => self.localize_folding_ranges(&request, &mut raw),
            "textDocument/codeAction" => {
                // Merging actions across cell boundaries is unsupported;
                // drop the whole list rather than translate it partially.
                if self.cell_span(&request).is_some() {
                    raw["result"] = json!([]);
                }
            }
            "textDocument/semanticTokens/full" => self.clear_semantic_tokens(&request, &mut raw),
            "textDocument/formatting" => self.localize_formatting_edits(&request, &mut raw),
            _ => {}
        }

        ServerRouting::forward(vec![raw])
    }

    /// Split a notebook-wide diagnostics notification into one per cell.
    ///
    /// Each cell keeps the diagnostics whose virtual start line falls in
    /// its span, translated to local coordinates. Cells with nothing left
    /// still get an empty notification so the editor clears stale
    /// squiggles; diagnostics outside every cell's span are dropped.
    fn fan_out_diagnostics(&self, raw: Value) -> Vec<Value> {
        let Some(notebook) = raw
            .pointer("/params/uri")
            .and_then(Value::as_str)
            .and_then(|uri| self.registry.notebook(uri))
        else {
            return vec![raw];
        };

        let diagnostics: Vec<Diagnostic> = match raw
            .pointer("/params/diagnostics")
            .cloned()
            .map(serde_json::from_value)
        {
            Some(Ok(diagnostics)) => diagnostics,
            _ => {
                debug!(notebook = %notebook.uri, "unparseable diagnostics payload, forwarding");
                return vec![raw];
            }
        };

        let mut out = Vec::with_capacity(notebook.cells.len());
        let mut offset = 0u32;
        for cell in &notebook.cells {
            let line_count = cell.line_count();
            let cell_diagnostics: Vec<Value> = diagnostics
                .iter()
                .filter(|diagnostic| {
                    local_line(diagnostic.range.start.line, offset, line_count).is_some()
                })
                .cloned()
                .map(|mut diagnostic| {
                    diagnostic.range = range_to_local(diagnostic.range, offset);
                    serde_json::to_value(diagnostic)
                })
                .filter_map(std::result::Result::ok)
                .collect();

            out.push(json!({
                "jsonrpc": "2.0",
                "method": "textDocument/publishDiagnostics",
                "params": {"uri": cell.uri, "diagnostics": cell_diagnostics}
            }));
            offset += line_count;
        }
        out
    }

    /// Overwrite the advertised capabilities with the notebook sync block
    /// this proxy actually services.
    fn inject_notebook_capability(&self, raw: &mut Value) {
        let cells: Vec<Value> = self
            .options
            .cell_languages()
            .iter()
            .map(|language| json!({"language": language}))
            .collect();
        let selector: Vec<Value> = self
            .options
            .notebook_types
            .iter()
            .map(|notebook_type| {
                json!({
                    "notebook": {"scheme": "file", "notebookType": notebook_type},
                    "cells": cells,
                })
            })
            .collect();

        if let Some(capabilities) = raw
            .pointer_mut("/result/capabilities")
            .and_then(Value::as_object_mut)
        {
            capabilities.insert(
                "notebookDocumentSync".to_string(),
                json!({"notebookSelector": selector}),
            );
        }
    }

    /// Blank out a full semantic token result for a tracked cell.
    ///
    /// The delta-encoded token stream cannot be sliced per cell.
    fn clear_semantic_tokens(&self, request: &PendingRequest, raw: &mut Value) {
        if self.cell_span(request).is_none() {
            return;
        }
        if let Some(result) = raw.get_mut("result").filter(|result| result.is_object()) {
            result["data"] = json!([]);
        }
    }

    /// Translate a scalar `result.range` back into cell coordinates.
    fn localize_result_range(&self, request: &PendingRequest, raw: &mut Value) {
        let Some(span) = self.cell_span(request) else {
            return;
        };
        if let Some(range) = raw.pointer_mut("/result/range") {
            shift_range_value(range, -i64::from(span.offset));
        }
    }

    /// Translate a folding range list, dropping items outside the cell.
    fn localize_folding_ranges(&self, request: &PendingRequest, raw: &mut Value) {
        let Some(span) = self.cell_span(request) else {
            return;
        };
        let Some(result) = raw.get_mut("result") else {
            return;
        };
        let Ok(ranges) = serde_json::from_value::<Vec<FoldingRange>>(result.clone()) else {
            return;
        };

        let localized: Vec<FoldingRange> = ranges
            .into_iter()
            .filter_map(|mut range| {
                let start = local_line(range.start_line, span.offset, span.line_count)?;
                range.start_line = start;
                range.end_line = range.end_line.saturating_sub(span.offset);
                Some(range)
            })
            .collect();

        if let Ok(value) = serde_json::to_value(localized) {
            *result = value;
        }
    }

    /// Translate a formatting edit list, dropping edits outside the cell.
    fn localize_formatting_edits(&self, request: &PendingRequest, raw: &mut Value) {
        let Some(span) = self.cell_span(request) else {
            return;
        };
        let Some(result) = raw.get_mut("result") else {
            return;
        };
        let Ok(edits) = serde_json::from_value::<Vec<TextEdit>>(result.clone()) else {
            return;
        };

        let localized: Vec<TextEdit> = edits
            .into_iter()
            .filter(|edit| {
                local_line(edit.range.start.line, span.offset, span.line_count).is_some()
            })
            .map(|mut edit| {
                edit.range = range_to_local(edit.range, span.offset);
                edit
            })
            .collect();

        if let Ok(value) = serde_json::to_value(localized) {
            *result = value;
        }
    }

    /// Resolve the cell addressed by the original request, using the
    /// cell's *current* span; structural edits may have moved it since
    /// the request went out.
    fn cell_span(&self, request: &PendingRequest) -> Option<CellSpan> {
        let cell_uri = request
            .params
            .pointer("/textDocument/uri")
            .and_then(Value::as_str)?;
        let notebook = self.registry.notebook_by_cell(cell_uri)?;
        let offset = notebook.offset_of(cell_uri)?;
        let line_count = notebook.cell(cell_uri)?.line_count();
        Some(CellSpan { offset, line_count })
    }
}
