//! VS Code settings integration.
//!
//! Rewrites the Python analysis extra-paths setting so the editor can
//! resolve first-party sources that live outside site-packages.

use crate::error::{BazenvError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The settings key holding the analysis extra search paths.
pub const EXTRA_PATHS_KEY: &str = "python.analysis.extraPaths";

/// Default per-project settings file, relative to the project root.
pub const DEFAULT_SETTINGS_PATH: &str = ".vscode/settings.json";

/// Collect every directory named `src` under the workspace's `python` tree.
///
/// Paths are returned absolute (the workspace root is absolute) and
/// sorted. A missing `python` tree yields an empty list.
pub fn collect_src_dirs(workspace: &Path) -> Vec<PathBuf> {
    let python_root = workspace.join("python");

    let mut dirs: Vec<PathBuf> = WalkDir::new(python_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir() && entry.file_name() == "src")
        .map(|entry| entry.into_path())
        .collect();
    dirs.sort();
    dirs
}

/// Overwrite the extra-paths setting in a settings file.
///
/// With `workspace_file` set the file is treated as a multi-root
/// workspace file and the key is written under its `settings` object
/// (created if absent); otherwise the file is a flat settings file and
/// the key is written at the top level. All other keys are preserved.
///
/// Returns `Ok(false)` when the file does not exist; no file is created.
pub fn update_extra_paths(
    settings_path: &Path,
    workspace_file: bool,
    paths: &[PathBuf],
) -> Result<bool> {
    if !settings_path.exists() {
        return Ok(false);
    }

    let content = fs::read_to_string(settings_path)?;
    let mut data: Value = serde_json::from_str(&content)?;

    let not_an_object = || {
        BazenvError::ConfigError(format!(
            "{} does not contain a JSON object",
            settings_path.display()
        ))
    };

    let list = Value::Array(
        paths
            .iter()
            .map(|p| Value::String(p.to_string_lossy().into_owned()))
            .collect(),
    );

    let target = if workspace_file {
        data.as_object_mut()
            .ok_or_else(not_an_object)?
            .entry("settings")
            .or_insert_with(|| Value::Object(Map::new()))
    } else {
        &mut data
    };

    target
        .as_object_mut()
        .ok_or_else(not_an_object)?
        .insert(EXTRA_PATHS_KEY.to_string(), list);

    fs::write(settings_path, to_pretty_json(&data)?)?;
    Ok(true)
}

/// Serialize with the four-space indentation VS Code settings files use.
fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_src_dirs_recursive() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("python/a/src")).unwrap();
        fs::create_dir_all(temp.path().join("python/b/nested/src")).unwrap();
        fs::create_dir_all(temp.path().join("python/c/source")).unwrap();
        // src directories outside python/ are not collected
        fs::create_dir_all(temp.path().join("go/src")).unwrap();

        let dirs = collect_src_dirs(temp.path());
        assert_eq!(
            dirs,
            vec![
                temp.path().join("python/a/src"),
                temp.path().join("python/b/nested/src"),
            ]
        );
    }

    #[test]
    fn test_collect_src_dirs_missing_python_tree() {
        let temp = TempDir::new().unwrap();
        assert!(collect_src_dirs(temp.path()).is_empty());
    }

    #[test]
    fn test_update_flat_settings_preserves_other_keys() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join("settings.json");
        fs::write(&settings, r#"{"other": 1}"#).unwrap();

        let paths = vec![
            PathBuf::from("/ws/python/a/src"),
            PathBuf::from("/ws/python/b/src"),
        ];
        assert!(update_extra_paths(&settings, false, &paths).unwrap());

        let data: Value = serde_json::from_str(&fs::read_to_string(&settings).unwrap()).unwrap();
        assert_eq!(data["other"], 1);
        assert_eq!(
            data[EXTRA_PATHS_KEY],
            serde_json::json!(["/ws/python/a/src", "/ws/python/b/src"])
        );
    }

    #[test]
    fn test_update_overwrites_previous_value() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join("settings.json");
        fs::write(
            &settings,
            r#"{"python.analysis.extraPaths": ["/stale/path"]}"#,
        )
        .unwrap();

        let paths = vec![PathBuf::from("/fresh/src")];
        update_extra_paths(&settings, false, &paths).unwrap();

        let data: Value = serde_json::from_str(&fs::read_to_string(&settings).unwrap()).unwrap();
        assert_eq!(data[EXTRA_PATHS_KEY], serde_json::json!(["/fresh/src"]));
    }

    #[test]
    fn test_update_workspace_file_nests_under_settings() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().join("acme.code-workspace");
        fs::write(
            &workspace,
            r#"{"folders": [{"path": "."}], "settings": {"editor.rulers": [100]}}"#,
        )
        .unwrap();

        let paths = vec![PathBuf::from("/ws/python/a/src")];
        assert!(update_extra_paths(&workspace, true, &paths).unwrap());

        let data: Value = serde_json::from_str(&fs::read_to_string(&workspace).unwrap()).unwrap();
        assert_eq!(data["folders"][0]["path"], ".");
        assert_eq!(data["settings"]["editor.rulers"], serde_json::json!([100]));
        assert_eq!(
            data["settings"][EXTRA_PATHS_KEY],
            serde_json::json!(["/ws/python/a/src"])
        );
    }

    #[test]
    fn test_update_workspace_file_creates_settings_object() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().join("acme.code-workspace");
        fs::write(&workspace, r#"{"folders": []}"#).unwrap();

        update_extra_paths(&workspace, true, &[PathBuf::from("/p/src")]).unwrap();

        let data: Value = serde_json::from_str(&fs::read_to_string(&workspace).unwrap()).unwrap();
        assert_eq!(
            data["settings"][EXTRA_PATHS_KEY],
            serde_json::json!(["/p/src"])
        );
    }

    #[test]
    fn test_missing_settings_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join(".vscode/settings.json");

        let updated = update_extra_paths(&settings, false, &[]).unwrap();
        assert!(!updated);
        assert!(!settings.exists());
    }

    #[test]
    fn test_output_uses_four_space_indent() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join("settings.json");
        fs::write(&settings, r#"{"other": 1}"#).unwrap();

        update_extra_paths(&settings, false, &[PathBuf::from("/a/src")]).unwrap();

        let content = fs::read_to_string(&settings).unwrap();
        assert!(content.contains("\n    \"other\""));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join("settings.json");
        fs::write(&settings, "{ not json").unwrap();

        assert!(update_extra_paths(&settings, false, &[]).is_err());
    }
}
