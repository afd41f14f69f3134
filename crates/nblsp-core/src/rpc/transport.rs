//! LSP transport layer for stdio communication.
//!
//! This module implements the LSP header-content message format. Messages
//! follow the format:
//! ```text
//! Content-Length: 123\r\n
//! \r\n
//! {"jsonrpc":"2.0",...}
//! ```
//!
//! The reader and writer are generic over the underlying streams because the
//! same framing serves both sides of the proxy: the editor on the process's
//! own stdio, and the spawned language server on its child stdio.

use std::collections::HashMap;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::rpc::Message;

/// Reads Content-Length framed JSON-RPC messages from a stream.
#[derive(Debug)]
pub struct MessageReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    /// Create a reader over a raw byte stream.
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    /// Receive and classify the next message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamClosed`] on EOF between messages, and a fatal
    /// error if headers are malformed, the content is truncated, or the
    /// payload is not valid JSON; `Content-Length` framing cannot be
    /// resynchronized once broken.
    pub async fn receive(&mut self) -> Result<Message> {
        let headers = self.read_headers().await?;

        let content_length = headers
            .get("content-length")
            .ok_or_else(|| Error::Protocol("missing Content-Length header".to_string()))?
            .parse::<usize>()
            .map_err(|e| Error::Protocol(format!("invalid Content-Length: {e}")))?;

        let content = self.read_content(content_length).await?;

        trace!("received message: {}", content);

        let value: Value = serde_json::from_str(&content)?;
        Ok(Message::classify(value))
    }

    /// Read headers until blank line.
    ///
    /// Headers are in the format "Key: Value\r\n" and are terminated by
    /// a blank line ("\r\n").
    async fn read_headers(&mut self) -> Result<HashMap<String, String>> {
        let mut headers = HashMap::new();
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = self.inner.read_line(&mut line).await?;

            // read_line returns 0 bytes on EOF
            if bytes_read == 0 {
                if headers.is_empty() {
                    return Err(Error::StreamClosed);
                }
                return Err(Error::Protocol(
                    "stream closed mid-header block".to_string(),
                ));
            }

            if line == "\r\n" || line == "\n" {
                break;
            }

            if let Some((key, value)) = line.trim_end().split_once(':') {
                headers.insert(key.trim().to_lowercase(), value.trim().to_string());
            } else {
                warn!("malformed header: {}", line.trim());
            }
        }

        Ok(headers)
    }

    /// Read exact number of content bytes.
    async fn read_content(&mut self, length: usize) -> Result<String> {
        let mut buffer = vec![0u8; length];
        self.inner.read_exact(&mut buffer).await?;

        String::from_utf8(buffer)
            .map_err(|e| Error::Protocol(format!("invalid UTF-8 in content: {e}")))
    }
}

/// Writes Content-Length framed JSON-RPC messages to a stream.
#[derive(Debug)]
pub struct MessageWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    /// Create a writer over a raw byte stream.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Serialize and send one message.
    ///
    /// Each call completes the full header + content write before returning;
    /// callers keep one writer per outbound stream so frames never
    /// interleave.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write fails.
    pub async fn send(&mut self, message: &Value) -> Result<()> {
        let content = serde_json::to_string(message)?;
        let header = format!("Content-Length: {}\r\n\r\n", content.len());

        trace!("sending message: {}", content);

        self.inner.write_all(header.as_bytes()).await?;
        self.inner.write_all(content.as_bytes()).await?;
        self.inner.flush().await?;

        Ok(())
    }
}
