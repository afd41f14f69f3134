//! nblsp - notebook to LSP proxy
//!
//! This binary sits between an editor and a single-file language server,
//! presenting each open notebook to the server as one virtual document and
//! translating coordinates in both directions.

use anyhow::{Context, Result};
use clap::Parser;

mod args;
mod logging;

use args::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting nblsp");

    let server_env = args.parse_server_env()?;

    let mut config = nblsp_core::ProxyConfig::load().context("failed to load configuration")?;
    config.merge_server_env(server_env);

    let end = nblsp_core::serve(config).await.context("proxy error")?;

    tracing::info!(?end, "nblsp shutdown complete");
    Ok(())
}
