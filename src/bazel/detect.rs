//! Bazel executable detection.

use std::path::{Path, PathBuf};

/// Returns platform-specific default Bazel installation paths.
fn default_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let mut paths = vec![
            PathBuf::from("/opt/homebrew/bin/bazel"),
            PathBuf::from("/usr/local/bin/bazel"),
        ];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("bin/bazel"));
        }

        paths
    }

    #[cfg(target_os = "windows")]
    {
        vec![
            PathBuf::from(r"C:\Program Files\bazel\bazel.exe"),
            PathBuf::from(r"C:\tools\bazel\bazel.exe"),
        ]
    }

    #[cfg(target_os = "linux")]
    {
        let mut paths = vec![
            PathBuf::from("/usr/bin/bazel"),
            PathBuf::from("/usr/local/bin/bazel"),
        ];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".local/bin/bazel"));
            paths.push(home.join("bin/bazel"));
        }

        paths
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        vec![]
    }
}

/// Check if a path is executable.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(windows)]
fn is_executable(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "exe" || ext == "bat" || ext == "cmd"
        })
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
fn is_executable(path: &Path) -> bool {
    path.exists()
}

/// Attempt to find the Bazel executable.
///
/// Detection order:
/// 1. BAZEL_PATH environment variable
/// 2. PATH search (via `which`), `bazelisk` accepted as a stand-in
/// 3. Platform-specific default paths
pub fn find_bazel() -> Option<PathBuf> {
    // 1. Check environment variable
    if let Ok(path) = std::env::var("BAZEL_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() && is_executable(&p) {
            return Some(p);
        }
    }

    // 2. Check PATH (using which)
    if let Ok(path) = which::which("bazel") {
        return Some(path);
    }

    if let Ok(path) = which::which("bazelisk") {
        return Some(path);
    }

    // 3. Check default installation paths
    default_paths()
        .into_iter()
        .find(|path| path.exists() && is_executable(path))
}
