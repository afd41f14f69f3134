//! The message router: the proxy's protocol state machine.
//!
//! One [`Router`] value owns everything a session mutates (the notebook
//! registry and the pending request table), so independent sessions can be
//! constructed and driven side by side in-process. The two message pumps
//! call [`Router::route_editor`] and [`Router::route_server`]; each call
//! classifies one inbound object and returns the rewritten messages to put
//! on the opposite wire.

mod editor;
mod pending;
mod server;
pub mod translate;

use serde_json::Value;

pub use pending::{PendingRequest, PendingRequestTable};

use crate::config::NotebookConfig;
use crate::error::Result;
use crate::notebook::NotebookRegistry;
use crate::rpc::Message;

/// Per-session routing state.
#[derive(Debug)]
pub struct Router {
    pub(crate) registry: NotebookRegistry,
    pub(crate) pending: PendingRequestTable,
    pub(crate) options: NotebookConfig,
}

/// Result of routing one server-side message.
#[derive(Debug)]
pub struct ServerRouting {
    /// Messages to relay to the editor, in order.
    pub outgoing: Vec<Value>,
    /// Set when the response to a proxied `shutdown` request was just
    /// relayed: the session must end after these messages are written.
    pub shutdown_complete: bool,
}

impl ServerRouting {
    const fn forward(outgoing: Vec<Value>) -> Self {
        Self {
            outgoing,
            shutdown_complete: false,
        }
    }
}

impl Router {
    /// Create a router for one proxy session.
    #[must_use]
    pub fn new(options: NotebookConfig) -> Self {
        Self {
            registry: NotebookRegistry::new(),
            pending: PendingRequestTable::new(),
            options,
        }
    }

    /// Route one message read from the editor; returns the messages to
    /// send to the server.
    ///
    /// # Errors
    ///
    /// Returns an error only for conditions fatal to the session, such as
    /// a malformed text edit.
    pub fn route_editor(&mut self, message: Message) -> Result<Vec<Value>> {
        match message {
            Message::Request { id, method, raw } => Ok(self.editor_request(id, &method, raw)),
            Message::Notification { method, raw } => self.editor_notification(&method, raw),
            // The editor answering a server-initiated request; those never
            // use notebook-relative URIs.
            Message::Response { raw, .. } | Message::Other { raw } => Ok(vec![raw]),
        }
    }

    /// Route one message read from the server; returns the messages to
    /// send to the editor plus the shutdown-completion flag.
    pub fn route_server(&mut self, message: Message) -> ServerRouting {
        match message {
            Message::Request { raw, .. } | Message::Other { raw } => {
                ServerRouting::forward(vec![raw])
            }
            Message::Notification { method, raw } => {
                ServerRouting::forward(self.server_notification(&method, raw))
            }
            Message::Response { id, raw } => self.server_response(&id, raw),
        }
    }

    /// Number of requests currently awaiting responses.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Number of notebooks currently tracked.
    #[must_use]
    pub fn tracked_notebooks(&self) -> usize {
        self.registry.len()
    }
}
