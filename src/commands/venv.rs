//! `bazenv venv` command implementation.

use crate::bazel::{BazelExecutor, Verbosity};
use crate::error::{BazenvError, Result};
use crate::venv::{PackageLinker, ProjectLayout, VenvBuilder};
use crate::vscode;
use std::fs;
use std::path::PathBuf;

/// Arguments for the venv command.
pub struct VenvArgs {
    /// Project directory
    pub path: PathBuf,
    /// Also link first-party libraries from python/libraries
    pub lib: bool,
    /// Multi-root VS Code workspace file to update instead of the
    /// default flat settings file
    pub vscode_workspace: Option<PathBuf>,
    /// Skip updating VS Code settings
    pub no_vscode: bool,
    /// Python interpreter used to create the virtualenv
    pub python: PathBuf,
    /// Path to Bazel executable
    pub bazel: PathBuf,
    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Execute the venv command.
pub fn execute(args: VenvArgs) -> Result<()> {
    let project_dir = args.path.canonicalize().unwrap_or(args.path.clone());

    let executor = BazelExecutor::new(args.bazel, args.verbosity);
    println!("Querying Bazel environment...");
    let info = executor.info(&project_dir)?;

    let layout = ProjectLayout::new(&project_dir);
    fs::create_dir_all(layout.local_dir())?;

    // Create the venv and its per-user alias (both only if absent).
    let builder = VenvBuilder::new(layout.venv_dir().to_path_buf(), args.python)
        .verbosity(args.verbosity);

    if builder.ensure_venv()? {
        println!("Created venv at {}", layout.venv_dir().display());
    } else {
        println!("Reusing venv at {}", layout.venv_dir().display());
    }

    let alias = builder.ensure_alias(&info.project_name(), &project_dir)?;
    println!("Venv alias: {}", alias.display());

    // Point the editor at first-party sources.
    if !args.no_vscode {
        let (settings_path, workspace_file) = match &args.vscode_workspace {
            Some(path) => (path.clone(), true),
            None => (project_dir.join(vscode::DEFAULT_SETTINGS_PATH), false),
        };

        let src_dirs = vscode::collect_src_dirs(&info.workspace);
        if vscode::update_extra_paths(&settings_path, workspace_file, &src_dirs)? {
            println!(
                "Updated {} ({} search paths)",
                settings_path.display(),
                src_dirs.len()
            );
        } else if args.verbosity >= 1 {
            eprintln!(
                "[bazenv] No settings file at {}, skipping",
                settings_path.display()
            );
        }
    }

    // Mirror Bazel-managed packages into site-packages.
    println!();
    println!("Linking packages into {}...", layout.site_packages().display());

    let linker = PackageLinker::new(layout.site_packages(), args.verbosity);
    let mut report = linker.link_external(&info.external_dir())?;

    if args.lib {
        report.merge(linker.link_libraries(&info.execution_root)?);
    }

    println!(
        "Linked {} package(s), skipped {}.",
        report.linked.len(),
        report.skipped
    );

    if !report.failed.is_empty() {
        println!();
        println!("{} package(s) could not be linked:", report.failed.len());
        for (dir, reason) in &report.failed {
            println!("  {}: {}", dir.display(), reason);
        }
    }

    Ok(())
}

/// Resolve the python interpreter for venv creation.
pub fn resolve_python(configured: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(python) = configured {
        if !python.exists() && which::which(&python).is_err() {
            return Err(BazenvError::ConfigError(format!(
                "python interpreter not found: {}",
                python.display()
            )));
        }
        return Ok(python);
    }

    // Unqualified name is fine; venv creation resolves it via PATH.
    Ok(which::which("python3").unwrap_or_else(|_| PathBuf::from("python3")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_python_default() {
        let python = resolve_python(None).unwrap();
        assert!(python.to_string_lossy().contains("python3"));
    }

    #[test]
    fn test_resolve_python_missing_configured_interpreter() {
        let result = resolve_python(Some(PathBuf::from("/nonexistent/python9")));
        assert!(result.is_err());
    }
}
