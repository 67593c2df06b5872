//! `bazenv version` command implementation.

use crate::error::{BazenvError, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::FuzzySelect;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The version file name searched for.
pub const VERSION_FILE_NAME: &str = "version.bzl";

/// Arguments for the version command.
pub struct VersionArgs {
    /// Project directory
    pub path: PathBuf,
    /// Version action (show, bump, or set)
    pub action: VersionAction,
    /// Operate on this file instead of picking interactively
    pub file: Option<PathBuf>,
}

/// Version action to perform.
#[derive(Debug, Clone)]
pub enum VersionAction {
    /// Print the selected version file's path
    Show,
    /// Bump patch version (0.0.X)
    BumpPatch,
    /// Bump minor version (0.X.0)
    BumpMinor,
    /// Bump major version (X.0.0)
    BumpMajor,
    /// Set specific version
    Set(String),
}

/// Parsed semantic version.
#[derive(Debug, Clone, PartialEq)]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemVer {
    /// Parse a version string.
    pub fn parse(version: &str) -> Option<Self> {
        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let major = parts[0].parse().ok()?;
        let minor = parts[1].parse().ok()?;
        let patch = parts[2].parse().ok()?;

        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// Bump patch version.
    pub fn bump_patch(&self) -> Self {
        Self {
            major: self.major,
            minor: self.minor,
            patch: self.patch + 1,
        }
    }

    /// Bump minor version.
    pub fn bump_minor(&self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
            patch: 0,
        }
    }

    /// Bump major version.
    pub fn bump_major(&self) -> Self {
        Self {
            major: self.major + 1,
            minor: 0,
            patch: 0,
        }
    }
}

impl std::fmt::Display for SemVer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Execute the version command.
pub fn execute(args: VersionArgs) -> Result<()> {
    let project_dir = args.path.canonicalize().map_err(|e| {
        BazenvError::ConfigError(format!(
            "Cannot access project directory '{}': {}",
            args.path.display(),
            e
        ))
    })?;

    let file = match args.file {
        Some(file) => file,
        None => {
            let candidates = find_version_files(&project_dir);
            if candidates.is_empty() {
                return Ok(());
            }
            match pick_version_file(&candidates)? {
                Some(file) => file,
                // Cancelled: print nothing.
                None => return Ok(()),
            }
        }
    };

    match args.action {
        VersionAction::Show => {
            println!("{}", file.display());
            Ok(())
        }
        VersionAction::BumpPatch
        | VersionAction::BumpMinor
        | VersionAction::BumpMajor
        | VersionAction::Set(_) => {
            let content = fs::read_to_string(&file)?;
            let current_version = extract_version(&content)
                .ok_or_else(|| BazenvError::NoVersionFound(file.clone()))?;

            let new_version = compute_new_version(&args.action, &current_version)?;
            update_version_in_file(&file, &content, &current_version, &new_version)?;
            println!("{}: {} -> {}", file.display(), current_version, new_version);
            Ok(())
        }
    }
}

/// Recursively collect every `version.bzl` under `root`, sorted.
pub fn find_version_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == VERSION_FILE_NAME)
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Present the candidates through a fuzzy picker.
fn pick_version_file(candidates: &[PathBuf]) -> Result<Option<PathBuf>> {
    let items: Vec<String> = candidates
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a version.bzl")
        .items(&items)
        .default(0)
        .interact_opt()?;

    Ok(selection.map(|idx| candidates[idx].clone()))
}

/// Compute new version based on action.
fn compute_new_version(action: &VersionAction, current_version: &str) -> Result<String> {
    match action {
        VersionAction::Show => unreachable!(),
        VersionAction::BumpPatch => {
            let semver = parse_semver(current_version)?;
            Ok(semver.bump_patch().to_string())
        }
        VersionAction::BumpMinor => {
            let semver = parse_semver(current_version)?;
            Ok(semver.bump_minor().to_string())
        }
        VersionAction::BumpMajor => {
            let semver = parse_semver(current_version)?;
            Ok(semver.bump_major().to_string())
        }
        VersionAction::Set(version) => {
            // Validate the new version format
            if SemVer::parse(version).is_none() {
                return Err(BazenvError::ConfigError(format!(
                    "Invalid version format '{}'. Expected X.Y.Z",
                    version
                )));
            }
            Ok(version.clone())
        }
    }
}

/// Parse version string to SemVer with error.
fn parse_semver(version: &str) -> Result<SemVer> {
    SemVer::parse(version).ok_or_else(|| {
        BazenvError::ConfigError(format!(
            "Cannot parse version '{}' as semantic version (X.Y.Z)",
            version
        ))
    })
}

/// Extract the value of the `VERSION = "..."` assignment.
fn extract_version(content: &str) -> Option<String> {
    for line in content.lines() {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix("VERSION") else {
            continue;
        };
        let Some(value) = rest.trim_start().strip_prefix('=') else {
            continue;
        };

        let value = value.trim();
        let quote = value.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let inner = &value[1..];
        if let Some(end) = inner.find(quote) {
            return Some(inner[..end].to_string());
        }
    }
    None
}

/// Update the version assignment in a version.bzl file.
///
/// Replaces within the VERSION line only, preserving formatting and
/// comments, and writes atomically.
fn update_version_in_file(
    path: &Path,
    content: &str,
    old_version: &str,
    new_version: &str,
) -> Result<()> {
    let new_content = replace_version_line(content, old_version, new_version)
        .ok_or_else(|| BazenvError::NoVersionFound(path.to_path_buf()))?;

    // Write atomically by writing to temp file first
    let temp_path = path.with_extension("bzl.tmp");
    fs::write(&temp_path, &new_content)?;

    // Clean up temp file on rename failure
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Replace the old version inside the VERSION assignment line.
fn replace_version_line(content: &str, old_version: &str, new_version: &str) -> Option<String> {
    let mut result = String::with_capacity(content.len());
    let mut replaced = false;

    for line in content.split_inclusive('\n') {
        if !replaced && line.trim_start().starts_with("VERSION") && line.contains(old_version) {
            result.push_str(&line.replace(old_version, new_version));
            replaced = true;
        } else {
            result.push_str(line);
        }
    }

    replaced.then_some(result)
}
