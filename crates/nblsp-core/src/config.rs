//! Configuration types and loading.
//!
//! Defaults match the Deno TypeScript notebook setup the proxy was built
//! around; a TOML file can repoint the proxy at another single-language
//! server without code changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable naming an explicit configuration file.
const CONFIG_PATH_VAR: &str = "NBLSP_CONFIG";

/// Configuration file name searched in the working and user config dirs.
const CONFIG_FILE: &str = "nblsp.toml";

/// Main configuration for the proxy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// The wrapped language server process.
    #[serde(default)]
    pub server: LanguageServerConfig,

    /// Notebook translation settings.
    #[serde(default)]
    pub notebook: NotebookConfig,
}

/// The command used to spawn the wrapped language server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageServerConfig {
    /// Executable to spawn.
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments passed to the executable.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Environment variables for the spawned process. Entries passed on
    /// the command line are merged on top of these.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for LanguageServerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            env: HashMap::new(),
        }
    }
}

/// How notebooks are rendered and advertised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotebookConfig {
    /// The single language id the wrapped server understands; also the
    /// language id of the synthesized virtual documents.
    #[serde(default = "default_language_id")]
    pub language_id: String,

    /// Language id reported for markup cells in the advertised selector.
    #[serde(default = "default_markup_language_id")]
    pub markup_language_id: String,

    /// Line-comment marker used to neutralize markup cell lines in the
    /// virtual document.
    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,

    /// Notebook types advertised in the injected `notebookDocumentSync`
    /// capability.
    #[serde(default = "default_notebook_types")]
    pub notebook_types: Vec<String>,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            language_id: default_language_id(),
            markup_language_id: default_markup_language_id(),
            comment_prefix: default_comment_prefix(),
            notebook_types: default_notebook_types(),
        }
    }
}

impl NotebookConfig {
    /// Cell languages advertised in the notebook selector.
    #[must_use]
    pub fn cell_languages(&self) -> [&str; 2] {
        [self.language_id.as_str(), self.markup_language_id.as_str()]
    }
}

impl ProxyConfig {
    /// Load configuration from the standard locations.
    ///
    /// Search order: the `NBLSP_CONFIG` environment variable, `nblsp.toml`
    /// in the current directory, then the user config directory. A missing
    /// file falls through to built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a discovered file cannot be read or parsed.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            return Self::load_from(Path::new(&path));
        }

        for candidate in Self::search_paths() {
            if candidate.is_file() {
                return Self::load_from(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Merge environment variable overrides for the spawned server.
    /// Overrides win over file-configured entries.
    pub fn merge_server_env(&mut self, overrides: HashMap<String, String>) {
        self.server.env.extend(overrides);
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("nblsp").join(CONFIG_FILE));
        }
        paths
    }
}

fn default_command() -> String {
    "deno".to_string()
}

fn default_args() -> Vec<String> {
    vec!["lsp".to_string()]
}

fn default_language_id() -> String {
    "typescript".to_string()
}

fn default_markup_language_id() -> String {
    "markdown".to_string()
}

fn default_comment_prefix() -> String {
    "//".to_string()
}

fn default_notebook_types() -> Vec<String> {
    vec!["nbts".to_string(), "jupyter-notebook".to_string()]
}
