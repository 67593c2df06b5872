//! Venv creation and stable alias management.

use crate::bazel::Verbosity;
use crate::error::{BazenvError, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Builder for the project virtualenv and its per-user alias.
pub struct VenvBuilder {
    venv_dir: PathBuf,
    python: PathBuf,
    aliases_dir: Option<PathBuf>,
    verbosity: Verbosity,
}

impl VenvBuilder {
    /// Create a new builder for a venv at `venv_dir`, created with `python`.
    pub fn new(venv_dir: PathBuf, python: PathBuf) -> Self {
        Self {
            venv_dir,
            python,
            aliases_dir: None,
            verbosity: 0,
        }
    }

    /// Override the aliases directory (default: `~/.virtualenvs`).
    pub fn aliases_dir(mut self, dir: PathBuf) -> Self {
        self.aliases_dir = Some(dir);
        self
    }

    /// Set the verbosity level.
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Get the venv directory.
    pub fn venv_dir(&self) -> &Path {
        &self.venv_dir
    }

    /// Create the virtualenv if it does not exist yet.
    ///
    /// An existing venv is reused unchanged. Returns whether a new venv
    /// was created. Anything the interpreter writes to stderr aborts
    /// the run, even on a zero exit code.
    pub fn ensure_venv(&self) -> Result<bool> {
        if self.venv_dir.is_dir() {
            return Ok(false);
        }

        if let Some(parent) = self.venv_dir.parent() {
            fs::create_dir_all(parent)?;
        }

        if self.verbosity >= 1 {
            eprintln!(
                "[bazenv] Executing: {} -m venv {}",
                self.python.display(),
                self.venv_dir.display()
            );
        }

        let output = Command::new(&self.python)
            .args(["-m", "venv"])
            .arg(&self.venv_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if !output.stderr.is_empty() || !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("exit code: {:?}", output.status.code())
            } else {
                stderr
            };
            return Err(BazenvError::VenvCreationFailed(reason));
        }

        Ok(true)
    }

    /// Ensure the per-user alias symlink exists and return its path.
    ///
    /// The alias name is a deterministic function of the project name
    /// and the project directory, so repeated runs from the same
    /// checkout reuse the same alias while same-named projects in
    /// different locations get distinct ones.
    pub fn ensure_alias(&self, project_name: &str, project_dir: &Path) -> Result<PathBuf> {
        let aliases_dir = match &self.aliases_dir {
            Some(dir) => dir.clone(),
            None => dirs::home_dir()
                .ok_or(BazenvError::HomeNotFound)?
                .join(".virtualenvs"),
        };
        fs::create_dir_all(&aliases_dir)?;

        let alias = aliases_dir.join(alias_name(project_name, project_dir));

        // A dangling symlink still counts as an existing entry.
        if fs::symlink_metadata(&alias).is_err() {
            super::linker::create_dir_symlink(&self.venv_dir, &alias)?;
        }

        Ok(alias)
    }
}

/// Compute the alias name: `{project}-{last 6 hex chars of sha256(dir)}`.
pub fn alias_name(project_name: &str, project_dir: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project_dir.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}-{}", project_name, &digest[digest.len() - 6..])
}
