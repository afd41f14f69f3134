//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable controlling the log level. The command line is
/// reserved for the server environment map, so the level comes from here.
const LOG_ENV_VAR: &str = "NBLSP_LOG";

/// Initialize the logging subsystem.
///
/// Level comes from `NBLSP_LOG` with an `info` fallback. Logs go to
/// stderr: stdout carries the LSP protocol and must stay clean.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_default();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init()
        .ok(); // Ignore if already initialized
}
