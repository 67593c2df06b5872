//! Bazel command execution and `bazel info` parsing.

use crate::error::{BazenvError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Verbosity levels for output.
/// - 0: quiet (errors only)
/// - 1: normal (-v, show commands)
/// - 2: verbose (-vv, show commands + output)
pub type Verbosity = u8;

/// Wrapper for executing Bazel commands.
pub struct BazelExecutor {
    executable: PathBuf,
    verbosity: Verbosity,
}

impl BazelExecutor {
    /// Create a new executor with the given Bazel executable path.
    pub fn new(executable: PathBuf, verbosity: Verbosity) -> Self {
        Self {
            executable,
            verbosity,
        }
    }

    /// Get the path to the Bazel executable.
    pub fn executable(&self) -> &PathBuf {
        &self.executable
    }

    /// Run `bazel info` in the given directory and parse its output.
    pub fn info(&self, dir: &Path) -> Result<BazelInfo> {
        self.log_execution("bazel info");

        let output = Command::new(&self.executable)
            .arg("info")
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        self.log_output(&output);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BazenvError::BazelCommandFailed(format!(
                "exit code: {:?}\nstderr: {}",
                output.status.code(),
                stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        BazelInfo::from_output(&stdout)
    }

    fn log_execution(&self, msg: &str) {
        // Level 1+: show commands being executed
        if self.verbosity >= 1 {
            eprintln!("[bazenv] Executing: {}", msg);
        }
    }

    fn log_output(&self, output: &Output) {
        // Level 2+: show command output
        if self.verbosity >= 2 {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stdout.is_empty() {
                eprintln!("[bazenv] stdout:\n{}", stdout);
            }
            if !stderr.is_empty() {
                eprintln!("[bazenv] stderr:\n{}", stderr);
            }
        }
    }
}

/// Parse `bazel info` output into a key/value map.
///
/// Each non-empty line is split on the first `": "`; lines without the
/// separator are ignored.
pub fn parse_info_output(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            line.split_once(": ")
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// The Bazel environment, as reported by `bazel info`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BazelInfo {
    /// Root of Bazel's output tree; external repositories live under
    /// `<output_base>/external`.
    pub output_base: PathBuf,
    /// Directory from which builds are executed; its base name is the
    /// project name.
    pub execution_root: PathBuf,
    /// The workspace root (the checkout itself).
    pub workspace: PathBuf,
    /// Every key/value pair the command reported.
    pub raw: BTreeMap<String, String>,
}

impl BazelInfo {
    /// Build from raw `bazel info` output, failing on missing required keys.
    pub fn from_output(text: &str) -> Result<Self> {
        let raw = parse_info_output(text);

        let required = |key: &str| -> Result<PathBuf> {
            raw.get(key)
                .map(PathBuf::from)
                .ok_or_else(|| BazenvError::MissingInfoKey(key.to_string()))
        };

        Ok(Self {
            output_base: required("output_base")?,
            execution_root: required("execution_root")?,
            workspace: required("workspace")?,
            raw,
        })
    }

    /// Directory holding Bazel-managed external repositories.
    pub fn external_dir(&self) -> PathBuf {
        self.output_base.join("external")
    }

    /// The project name, taken from the execution root's base name.
    pub fn project_name(&self) -> String {
        self.execution_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workspace".to_string())
    }
}
