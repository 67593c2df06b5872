//! Virtual environment creation and package linking.
//!
//! This module materializes a project-local venv and mirrors
//! Bazel-managed package directories into its site-packages via
//! symlinks, so editor tooling can resolve them.

mod builder;
mod linker;

pub use builder::{alias_name, VenvBuilder};
pub use linker::{LinkOutcome, LinkReport, PackageLinker, RESERVED_NAMES};

use std::path::{Path, PathBuf};

/// Subdirectory of the project holding local state.
pub const LOCAL_DIR_NAME: &str = ".local";

/// The venv directory name under the local state directory.
pub const VENV_DIR_NAME: &str = "python_venv";

/// Fallback python directory inside the venv's lib/ when none exists yet.
const DEFAULT_PYTHON_LIB_DIR: &str = "python3.7";

/// Filesystem locations derived from the project directory.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
    local_dir: PathBuf,
    venv_dir: PathBuf,
}

impl ProjectLayout {
    /// Derive the layout for a project rooted at `root`.
    pub fn new(root: &Path) -> Self {
        let local_dir = root.join(LOCAL_DIR_NAME);
        let venv_dir = local_dir.join(VENV_DIR_NAME);
        Self {
            root: root.to_path_buf(),
            local_dir,
            venv_dir,
        }
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.local` state directory.
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// The virtualenv directory.
    pub fn venv_dir(&self) -> &Path {
        &self.venv_dir
    }

    /// The venv's site-packages directory.
    ///
    /// Uses the venv's actual `lib/python*` directory when one exists,
    /// so links land where the interpreter that created the venv will
    /// look for them.
    pub fn site_packages(&self) -> PathBuf {
        let lib_dir = self.venv_dir.join("lib");

        let python_dir = std::fs::read_dir(&lib_dir)
            .ok()
            .into_iter()
            .flatten()
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("python"))
            .min()
            .unwrap_or_else(|| DEFAULT_PYTHON_LIB_DIR.to_string());

        lib_dir.join(python_dir).join("site-packages")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = ProjectLayout::new(Path::new("/work/acme"));
        assert_eq!(layout.local_dir(), Path::new("/work/acme/.local"));
        assert_eq!(
            layout.venv_dir(),
            Path::new("/work/acme/.local/python_venv")
        );
    }

    #[test]
    fn test_site_packages_defaults_without_venv() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        assert_eq!(
            layout.site_packages(),
            temp.path()
                .join(".local/python_venv/lib/python3.7/site-packages")
        );
    }

    #[test]
    fn test_site_packages_uses_existing_python_dir() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        fs::create_dir_all(layout.venv_dir().join("lib/python3.11")).unwrap();

        assert_eq!(
            layout.site_packages(),
            layout.venv_dir().join("lib/python3.11/site-packages")
        );
    }
}
