//! `bazenv clean` command implementation.

use crate::error::Result;
use crate::venv::ProjectLayout;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the clean command.
pub struct CleanArgs {
    /// Project directory
    pub path: PathBuf,
    /// Directory holding venv aliases
    pub aliases_dir: PathBuf,
    /// Only show what would be deleted
    pub dry_run: bool,
}

/// Execute the clean command.
///
/// Removes the project venv and any alias symlink pointing at it.
pub fn execute(args: CleanArgs) -> Result<()> {
    let project_dir = args.path.canonicalize().unwrap_or(args.path.clone());
    let layout = ProjectLayout::new(&project_dir);

    if args.dry_run {
        println!("Dry run: showing what would be deleted...");
    } else {
        println!("Cleaning virtualenv state...");
    }
    println!();

    let mut deleted_count = 0;

    // Aliases first, while the venv they point at still exists.
    for alias in find_aliases(&args.aliases_dir, layout.venv_dir()) {
        deleted_count += clean_path(&alias, args.dry_run)?;
    }

    if layout.venv_dir().exists() {
        deleted_count += clean_path(layout.venv_dir(), args.dry_run)?;
    }

    println!();
    if deleted_count == 0 {
        println!("Nothing to clean.");
    } else if args.dry_run {
        println!(
            "Would delete {} item(s). Run without --dry-run to actually delete.",
            deleted_count
        );
    } else {
        println!("Cleaned {} item(s).", deleted_count);
    }

    Ok(())
}

/// Symlinks in the aliases directory pointing at the given venv.
fn find_aliases(aliases_dir: &Path, venv_dir: &Path) -> Vec<PathBuf> {
    let mut aliases: Vec<PathBuf> = fs::read_dir(aliases_dir)
        .ok()
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| fs::read_link(path).is_ok_and(|target| target == venv_dir))
        .collect();
    aliases.sort();
    aliases
}

/// Clean a single path (file, symlink, or directory).
fn clean_path(path: &Path, dry_run: bool) -> Result<usize> {
    if dry_run {
        println!("  Would delete: {}", path.display());
    } else {
        println!("  Deleting: {}", path.display());
        let meta = fs::symlink_metadata(path)?;
        if meta.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
    }
    Ok(1)
}
