//! Command-line argument parsing.

use std::collections::HashMap;

use clap::Parser;

/// Notebook to LSP proxy
///
/// Wraps a single-file language server so it can analyze multi-cell
/// notebooks, translating every coordinate-bearing message between
/// cell-local and virtual-document coordinates.
#[derive(Debug, Parser)]
#[command(name = "nblsp")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// JSON-encoded map of environment variables for the spawned
    /// language server, e.g. '{"DENO_DIR":"/tmp/deno"}'
    #[arg(value_name = "ENV_JSON")]
    pub server_env: Option<String>,
}

impl Args {
    /// Decode the positional environment map, if one was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is not a JSON object of strings.
    pub fn parse_server_env(&self) -> anyhow::Result<HashMap<String, String>> {
        match &self.server_env {
            None => Ok(HashMap::new()),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("invalid environment map argument: {e}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let args = Args::parse_from(["nblsp"]);
        assert!(args.server_env.is_none());
        assert!(args.parse_server_env().unwrap().is_empty());
    }

    #[test]
    fn test_env_map_argument() {
        let args = Args::parse_from(["nblsp", r#"{"DENO_DIR":"/tmp/deno","NO_COLOR":"1"}"#]);
        let env = args.parse_server_env().unwrap();
        assert_eq!(env["DENO_DIR"], "/tmp/deno");
        assert_eq!(env["NO_COLOR"], "1");
    }

    #[test]
    fn test_invalid_env_map_rejected() {
        let args = Args::parse_from(["nblsp", "not json"]);
        assert!(args.parse_server_env().is_err());
    }

    #[test]
    fn test_non_object_env_map_rejected() {
        let args = Args::parse_from(["nblsp", r#"["a"]"#]);
        assert!(args.parse_server_env().is_err());
    }
}
