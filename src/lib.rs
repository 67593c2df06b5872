//! Bazenv - Bazel Python development environment CLI
//!
//! Mirrors Bazel-managed Python packages into a local virtualenv so
//! editors and type checkers can resolve them.

pub mod bazel;
pub mod commands;
pub mod config;
pub mod error;
pub mod venv;
pub mod vscode;

pub use config::Config;
pub use error::{BazenvError, Result};
