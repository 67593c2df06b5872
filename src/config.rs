//! Configuration file handling for bazenv.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The configuration file name.
pub const CONFIG_FILE_NAME: &str = "bazenv.toml";

/// Configuration from bazenv.toml.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Path to Bazel executable
    pub bazel_path: Option<PathBuf>,

    /// Python interpreter used to create the virtualenv
    pub python_path: Option<PathBuf>,

    /// Always link first-party libraries (as if --lib were passed)
    #[serde(default)]
    pub include_libraries: bool,

    /// Multi-root VS Code workspace file to update instead of
    /// .vscode/settings.json
    pub vscode_workspace: Option<PathBuf>,
}

impl Config {
    /// Load configuration from bazenv.toml in the given directory or its parents.
    ///
    /// Returns `Ok(None)` if no configuration file is found.
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir
            .canonicalize()
            .unwrap_or_else(|_| start_dir.to_path_buf());

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let content = std::fs::read_to_string(&config_path)?;
                let config: Self = toml::from_str(&content)?;
                return Ok(Some(config));
            }

            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load configuration from the current directory.
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}
