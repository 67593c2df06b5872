//! Error types for bazenv.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bazenv operations.
pub type Result<T> = std::result::Result<T, BazenvError>;

/// Errors that can occur during bazenv operations.
#[derive(Error, Debug)]
pub enum BazenvError {
    #[error("Bazel not found. Install Bazel or specify path with --bazel")]
    BazelNotFound,

    #[error("Bazel command failed: {0}")]
    BazelCommandFailed(String),

    #[error("`bazel info` output is missing required key '{0}'")]
    MissingInfoKey(String),

    #[error("virtualenv creation failed: {0}")]
    VenvCreationFailed(String),

    #[error("Cannot determine home directory")]
    HomeNotFound,

    #[error("No VERSION assignment found in {0}")]
    NoVersionFound(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}
