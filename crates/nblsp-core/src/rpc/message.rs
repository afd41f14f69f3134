//! JSON-RPC 2.0 message classification.
//!
//! Every inbound object is decoded exactly once, at the transport boundary,
//! into a tagged [`Message`] variant. Variants keep the raw
//! [`serde_json::Value`] alongside the envelope fields the router needs, so
//! rewrites mutate the value in place and everything the proxy does not
//! understand (unknown fields, `result: null`, custom extensions) survives
//! the round trip byte-for-byte.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request ID can be a number or string per JSON-RPC 2.0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl RequestId {
    /// Extract a request id from a JSON value, if it has a usable shape.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }
}

/// A classified JSON-RPC object.
///
/// Classification follows the envelope only: `method` + `id` is a request,
/// `method` without `id` is a notification, `id` with a `result` or `error`
/// member (and no `method`) is a response. Anything else is `Other` and is
/// forwarded verbatim in both directions.
#[derive(Debug, Clone)]
pub enum Message {
    /// A request expecting a correlated response.
    Request {
        /// Request identifier.
        id: RequestId,
        /// Method name.
        method: String,
        /// The full message object.
        raw: Value,
    },
    /// A one-way notification.
    Notification {
        /// Method name.
        method: String,
        /// The full message object.
        raw: Value,
    },
    /// A response to an earlier request.
    Response {
        /// Identifier of the request being answered.
        id: RequestId,
        /// The full message object.
        raw: Value,
    },
    /// Anything that does not match the three JSON-RPC shapes.
    Other {
        /// The full message object.
        raw: Value,
    },
}

impl Message {
    /// Classify a decoded JSON value.
    #[must_use]
    pub fn classify(raw: Value) -> Self {
        let method = raw.get("method").and_then(Value::as_str).map(String::from);
        let id = raw.get("id").and_then(RequestId::from_value);

        match (method, id) {
            (Some(method), Some(id)) => Self::Request { id, method, raw },
            (Some(method), None) => Self::Notification { method, raw },
            (None, Some(id)) if raw.get("result").is_some() || raw.get("error").is_some() => {
                Self::Response { id, raw }
            }
            _ => Self::Other { raw },
        }
    }

    /// Consume the message, returning the underlying JSON object.
    #[must_use]
    pub fn into_raw(self) -> Value {
        match self {
            Self::Request { raw, .. }
            | Self::Notification { raw, .. }
            | Self::Response { raw, .. }
            | Self::Other { raw } => raw,
        }
    }
}
