//! Configuration loading.

use crate::orchestrator::CliError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use tracing::debug;

/// Name of the config file looked up in the workspace.
pub const CONFIG_FILE: &str = "deep-classes.json";

/// Project configuration from `deep-classes.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
    /// Support `rtl:` and `ltr:` prefixed classes.
    pub rtl: bool,

    /// Make `gl:` prefixed classes global.
    pub global_prefix: bool,

    /// File extensions to process.
    pub extensions: Vec<String>,

    /// Glob patterns to ignore, relative to the workspace.
    pub ignore: Vec<String>,
}

impl Config {
    /// Loads configuration from a JSON file.
    pub fn load(path: &Utf8Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CliError::InvalidConfig {
            path: path.to_owned(),
            source,
        })
    }

    /// Loads `explicit` if given, otherwise `deep-classes.json` in the
    /// workspace when it exists.
    pub fn find(workspace: &Utf8Path, explicit: Option<&Utf8Path>) -> Result<Self, CliError> {
        let path: Utf8PathBuf = match explicit {
            Some(path) => workspace.join(path),
            None => {
                let path = workspace.join(CONFIG_FILE);
                if !path.is_file() {
                    debug!("no {CONFIG_FILE} in {workspace}, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };
        debug!(%path, "loading config");
        Self::load(&path)
    }

    /// Returns the file extensions to process.
    pub fn file_extensions(&self) -> Vec<&str> {
        if self.extensions.is_empty() {
            vec![".svelte"]
        } else {
            self.extensions.iter().map(|s| s.as_str()).collect()
        }
    }
}
