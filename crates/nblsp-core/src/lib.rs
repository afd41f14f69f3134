//! # nblsp-core
//!
//! Core library for the notebook-to-LSP proxy.
//!
//! A language server built to analyze one flat source file is presented
//! with a single synthesized "virtual document" per notebook; every
//! coordinate-bearing JSON-RPC message between the editor and the server is
//! translated between cell-local and virtual-document coordinates in both
//! directions.
//!
//! ## Architecture
//!
//! - [`rpc`] - JSON-RPC message classification and Content-Length framing
//! - [`notebook`] - tracked notebook state, virtual text, text patching
//! - [`router`] - the bidirectional rewrite rules and request correlation
//! - [`config`] - configuration types and loading
//! - [`error`] - error types for the library
//!
//! ## Example
//!
//! ```rust,ignore
//! use nblsp_core::{ProxyConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nblsp_core::Error> {
//!     let config = ProxyConfig::load()?;
//!     serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod notebook;
pub mod router;
pub mod rpc;

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub use config::ProxyConfig;
pub use error::{Error, Result};
pub use router::Router;
use rpc::{MessageReader, MessageWriter};

/// Why a session ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The response to a proxied `shutdown` request was relayed.
    ShutdownComplete,
    /// The spawned language server exited on its own.
    ServerExited,
}

/// Spawn the configured language server and proxy between it and the
/// process's own stdio until a terminal condition.
///
/// Both terminal conditions (shutdown response relayed, or the child
/// exiting by itself) return `Ok`; the caller exits 0. Every other
/// termination path is an error.
///
/// # Errors
///
/// Returns an error if the child cannot be spawned, if either stream
/// breaks framing, or if an editor change desyncs a tracked buffer.
pub async fn serve(config: ProxyConfig) -> Result<SessionEnd> {
    info!(
        command = %config.server.command,
        args = ?config.server.args,
        "spawning language server"
    );

    let mut child = Command::new(&config.server.command)
        .args(&config.server.args)
        .envs(&config.server.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::ServerSpawnFailed {
            command: config.server.command.clone(),
            source: e,
        })?;

    let server_stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::Protocol("failed to capture server stdin".to_string()))?;
    let server_stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Protocol("failed to capture server stdout".to_string()))?;

    let router = Router::new(config.notebook);
    let end = run_session(
        tokio::io::stdin(),
        tokio::io::stdout(),
        server_stdout,
        server_stdin,
        router,
    )
    .await;

    // The child may already be gone (it exited, or it honored shutdown);
    // make sure it is.
    child.start_kill().ok();

    match &end {
        Ok(reason) => info!(?reason, "session ended"),
        Err(error) => debug!(%error, "session failed"),
    }
    end
}

/// Run one proxy session over four raw streams until a terminal condition.
///
/// The streams are generic so tests can drive a session over in-memory
/// pipes. One pump task owns each direction, and with it exclusive write
/// access to its outbound stream, which keeps frames from interleaving.
/// The router is the only shared state and sits behind a single lock.
///
/// # Errors
///
/// An editor-side stream failure is always fatal. A server-side EOF is the
/// child exiting and ends the session cleanly.
pub async fn run_session<ER, EW, SR, SW>(
    editor_reader: ER,
    editor_writer: EW,
    server_reader: SR,
    server_writer: SW,
    router: Router,
) -> Result<SessionEnd>
where
    ER: AsyncRead + Unpin + Send + 'static,
    EW: AsyncWrite + Unpin + Send + 'static,
    SR: AsyncRead + Unpin + Send + 'static,
    SW: AsyncWrite + Unpin + Send + 'static,
{
    let router = Arc::new(Mutex::new(router));

    let mut editor_task = tokio::spawn(editor_pump(
        MessageReader::new(editor_reader),
        MessageWriter::new(server_writer),
        Arc::clone(&router),
    ));
    let mut server_task = tokio::spawn(server_pump(
        MessageReader::new(server_reader),
        MessageWriter::new(editor_writer),
        Arc::clone(&router),
    ));

    tokio::select! {
        editor_result = &mut editor_task => {
            server_task.abort();
            editor_result.map_err(|e| Error::Protocol(format!("editor pump panicked: {e}")))?
        }
        server_result = &mut server_task => {
            editor_task.abort();
            server_result.map_err(|e| Error::Protocol(format!("server pump panicked: {e}")))?
        }
    }
}

/// Editor → server pump. Never completes cleanly: the session's clean
/// endings are both observed on the server side.
async fn editor_pump<R, W>(
    mut reader: MessageReader<R>,
    mut writer: MessageWriter<W>,
    router: Arc<Mutex<Router>>,
) -> Result<SessionEnd>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let message = reader.receive().await?;
        let outgoing = router.lock().await.route_editor(message)?;
        for value in outgoing {
            writer.send(&value).await?;
        }
    }
}

/// Server → editor pump. Completes when the shutdown response has been
/// relayed or the child's stdout reaches EOF.
async fn server_pump<R, W>(
    mut reader: MessageReader<R>,
    mut writer: MessageWriter<W>,
    router: Arc<Mutex<Router>>,
) -> Result<SessionEnd>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let message = match reader.receive().await {
            Ok(message) => message,
            Err(Error::StreamClosed) => {
                debug!("language server closed its stdout");
                return Ok(SessionEnd::ServerExited);
            }
            Err(error) => return Err(error),
        };

        let routing = router.lock().await.route_server(message);
        for value in routing.outgoing {
            writer.send(&value).await?;
        }
        if routing.shutdown_complete {
            return Ok(SessionEnd::ShutdownComplete);
        }
    }
}
