//! Error types for nblsp-core.
//!
//! This module defines the canonical error type for the library. A few
//! variants carry routing-relevant meaning: [`Error::StreamClosed`] marks a
//! clean EOF (which the server pump treats as a terminal condition, and the
//! editor pump treats as fatal), while [`Error::MalformedEdit`] marks an
//! unrecoverable desync between the proxy's cell buffers and the editor's.

/// The main error type for nblsp-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A text edit did not match either recognized shape (range + text, or
    /// full-text replace). Applying it would silently corrupt the tracked
    /// cell buffer, so the session fails instead.
    #[error("malformed text edit: {0}")]
    MalformedEdit(String),

    /// JSON-RPC framing violation on one of the streams.
    ///
    /// `Content-Length` framing cannot be resynchronized mid-stream, so
    /// this is always fatal to the proxy.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A stream reached EOF between messages.
    #[error("stream closed")]
    StreamClosed,

    /// The language server process failed to spawn.
    #[error("failed to spawn language server '{command}': {source}")]
    ServerSpawnFailed {
        /// Command that failed to spawn.
        command: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A specialized Result type for nblsp-core operations.
pub type Result<T> = std::result::Result<T, Error>;
