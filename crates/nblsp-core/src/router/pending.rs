//! Pending request correlation.
//!
//! Every editor-issued request is recorded here before it is forwarded, so
//! the eventual server response can be rewritten with the request's
//! original context. Entries hold the params as the editor sent them
//! (pre-rewrite): response translation needs the original cell URI, not
//! the substituted notebook URI.

use std::collections::HashMap;

use serde_json::Value;

use crate::rpc::RequestId;

/// Context of one in-flight editor request.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// The request's method.
    pub method: String,
    /// Snapshot of the params exactly as the editor sent them.
    pub params: Value,
}

/// Table of in-flight editor requests by id.
#[derive(Debug, Default)]
pub struct PendingRequestTable {
    entries: HashMap<RequestId, PendingRequest>,
}

impl PendingRequestTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of in-flight requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no requests are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a request before it is forwarded. A reused id replaces the
    /// stale entry.
    pub fn insert(&mut self, id: RequestId, method: String, params: Value) {
        self.entries.insert(id, PendingRequest { method, params });
    }

    /// Consume the entry for a response. Each entry is taken at most once.
    pub fn take(&mut self, id: &RequestId) -> Option<PendingRequest> {
        self.entries.remove(id)
    }

    /// Drop an entry without consuming it (cancellation). Returns whether
    /// an entry existed.
    pub fn remove(&mut self, id: &RequestId) -> bool {
        self.entries.remove(id).is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_insert_and_take() {
        let mut table = PendingRequestTable::new();
        table.insert(
            RequestId::Number(1),
            "textDocument/hover".to_string(),
            json!({"position": {"line": 0, "character": 8}}),
        );
        assert_eq!(table.len(), 1);

        let entry = table.take(&RequestId::Number(1)).unwrap();
        assert_eq!(entry.method, "textDocument/hover");
        assert_eq!(entry.params["position"]["character"], 8);
    }

    #[test]
    fn test_take_consumes_exactly_once() {
        let mut table = PendingRequestTable::new();
        table.insert(RequestId::Number(1), "shutdown".to_string(), Value::Null);

        assert!(table.take(&RequestId::Number(1)).is_some());
        assert!(table.take(&RequestId::Number(1)).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_for_cancellation() {
        let mut table = PendingRequestTable::new();
        table.insert(
            RequestId::String("r1".to_string()),
            "textDocument/completion".to_string(),
            Value::Null,
        );

        assert!(table.remove(&RequestId::String("r1".to_string())));
        // A late response now finds nothing and is forwarded untouched.
        assert!(table.take(&RequestId::String("r1".to_string())).is_none());
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut table = PendingRequestTable::new();
        assert!(!table.remove(&RequestId::Number(99)));
    }

    #[test]
    fn test_reused_id_replaces_entry() {
        let mut table = PendingRequestTable::new();
        table.insert(RequestId::Number(1), "first".to_string(), Value::Null);
        table.insert(RequestId::Number(1), "second".to_string(), Value::Null);

        assert_eq!(table.len(), 1);
        assert_eq!(table.take(&RequestId::Number(1)).unwrap().method, "second");
    }
}
