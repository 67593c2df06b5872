//! Package linking into the venv's site-packages.

use crate::bazel::Verbosity;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory names never linked into site-packages.
pub const RESERVED_NAMES: &[&str] = &["__pycache__", "setuptools", "pkg_resources"];

/// Marker files identifying a directory as Bazel-managed.
const BUILD_MARKERS: &[&str] = &["BUILD", "BUILD.bazel"];

/// Substring marking an external repository as pip-sourced.
const PIP_MARKER: &str = "_pip_";

/// Result of linking a single package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A symlink was created (replacing any previous entry).
    Linked,
    /// The directory name is in the reserved set.
    SkippedReserved,
    /// The directory carries a build-description file and was not
    /// requested as a source tree.
    SkippedBuildManaged,
    /// Linking failed; the run continues.
    Failed(String),
}

/// Aggregated outcome of a linking walk.
#[derive(Debug, Default)]
pub struct LinkReport {
    pub linked: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl LinkReport {
    fn record(&mut self, dir: &Path, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Linked => self.linked.push(dir.to_path_buf()),
            LinkOutcome::SkippedReserved | LinkOutcome::SkippedBuildManaged => self.skipped += 1,
            LinkOutcome::Failed(reason) => self.failed.push((dir.to_path_buf(), reason)),
        }
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: LinkReport) {
        self.linked.extend(other.linked);
        self.skipped += other.skipped;
        self.failed.extend(other.failed);
    }
}

/// Mirrors package directories into a site-packages directory via symlinks.
pub struct PackageLinker {
    site_packages: PathBuf,
    verbosity: Verbosity,
}

impl PackageLinker {
    /// Create a linker targeting the given site-packages directory.
    pub fn new(site_packages: PathBuf, verbosity: Verbosity) -> Self {
        Self {
            site_packages,
            verbosity,
        }
    }

    /// Link a single package directory into site-packages.
    ///
    /// The destination is named after the directory's base name.
    /// Anything already at the destination is removed first
    /// (last-write-wins). Failures are reported, never propagated.
    pub fn link_package(&self, dir: &Path, copy_from_src: bool) -> LinkOutcome {
        let name = match dir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return LinkOutcome::Failed("directory has no base name".into()),
        };

        if RESERVED_NAMES.contains(&name.as_str()) {
            return LinkOutcome::SkippedReserved;
        }

        if !copy_from_src && BUILD_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
            return LinkOutcome::SkippedBuildManaged;
        }

        let dst = self.site_packages.join(&name);
        if self.verbosity >= 2 {
            eprintln!("[bazenv] {} ---> {}", dir.display(), dst.display());
        }

        if let Err(e) = remove_existing(&dst) {
            let reason = format!("cannot replace {}: {}", dst.display(), e);
            eprintln!("[bazenv] Warning: {}", reason);
            return LinkOutcome::Failed(reason);
        }

        match create_dir_symlink(dir, &dst) {
            Ok(()) => LinkOutcome::Linked,
            Err(e) => {
                let reason = format!("cannot link {}: {}", dst.display(), e);
                eprintln!("[bazenv] Warning: {}", reason);
                LinkOutcome::Failed(reason)
            }
        }
    }

    /// Link pip-sourced packages from Bazel's external-repository tree.
    ///
    /// Only first-level entries whose name contains `_pip_` are
    /// considered; package roots sit three directory levels below each
    /// such repository.
    pub fn link_external(&self, external_dir: &Path) -> Result<LinkReport> {
        fs::create_dir_all(&self.site_packages)?;

        let mut report = LinkReport::default();
        for entry in fs::read_dir(external_dir)?.flatten() {
            let repo = entry.path();
            if !repo.is_dir() {
                continue;
            }
            if !entry.file_name().to_string_lossy().contains(PIP_MARKER) {
                continue;
            }

            for level1 in subdirs(&repo) {
                for level2 in subdirs(&level1) {
                    for package in subdirs(&level2) {
                        let outcome = self.link_package(&package, false);
                        report.record(&package, outcome);
                    }
                }
            }
        }

        Ok(report)
    }

    /// Link first-party library packages from `python/libraries`.
    ///
    /// Each `python/libraries/<lib>/src/<pkg>` directory is linked as a
    /// plain source tree. A missing libraries tree yields an empty
    /// report.
    pub fn link_libraries(&self, execution_root: &Path) -> Result<LinkReport> {
        let mut report = LinkReport::default();

        let libraries = execution_root.join("python").join("libraries");
        if !libraries.is_dir() {
            if self.verbosity >= 1 {
                eprintln!(
                    "[bazenv] No libraries directory at {}",
                    libraries.display()
                );
            }
            return Ok(report);
        }

        fs::create_dir_all(&self.site_packages)?;

        for lib in subdirs(&libraries) {
            let src = lib.join("src");
            if !src.is_dir() {
                continue;
            }
            for package in subdirs(&src) {
                let outcome = self.link_package(&package, true);
                report.record(&package, outcome);
            }
        }

        Ok(report)
    }
}

/// Immediate subdirectories of `dir`, sorted for stable link order.
fn subdirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)
        .ok()
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

/// Remove whatever currently sits at `dst`, if anything.
fn remove_existing(dst: &Path) -> std::io::Result<()> {
    let meta = match fs::symlink_metadata(dst) {
        Ok(meta) => meta,
        Err(_) => return Ok(()),
    };

    #[cfg(windows)]
    if meta.file_type().is_symlink() {
        // Directory symlinks on Windows are removed as directories.
        return fs::remove_dir(dst).or_else(|_| fs::remove_file(dst));
    }

    if meta.is_dir() {
        fs::remove_dir_all(dst)
    } else {
        fs::remove_file(dst)
    }
}

/// Create a directory symlink at `dst` pointing to `src`.
#[cfg(unix)]
pub(crate) fn create_dir_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
pub(crate) fn create_dir_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn linker(temp: &TempDir) -> (PackageLinker, PathBuf) {
        let site = temp.path().join("site-packages");
        fs::create_dir_all(&site).unwrap();
        (PackageLinker::new(site.clone(), 0), site)
    }

    #[test]
    fn test_link_package_creates_symlink() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);
        let pkg = temp.path().join("requests");
        fs::create_dir_all(&pkg).unwrap();

        assert_eq!(linker.link_package(&pkg, false), LinkOutcome::Linked);
        assert_eq!(fs::read_link(site.join("requests")).unwrap(), pkg);
    }

    #[test]
    fn test_reserved_names_never_linked() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);

        for name in RESERVED_NAMES {
            let pkg = temp.path().join(name);
            fs::create_dir_all(&pkg).unwrap();

            assert_eq!(
                linker.link_package(&pkg, false),
                LinkOutcome::SkippedReserved
            );
            // Reserved regardless of the copy-from-source flag.
            assert_eq!(
                linker.link_package(&pkg, true),
                LinkOutcome::SkippedReserved
            );
            assert!(fs::symlink_metadata(site.join(name)).is_err());
        }
    }

    #[test]
    fn test_build_file_skipped_unless_copying_from_source() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);
        let pkg = temp.path().join("mypkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("BUILD"), "").unwrap();

        assert_eq!(
            linker.link_package(&pkg, false),
            LinkOutcome::SkippedBuildManaged
        );
        assert!(fs::symlink_metadata(site.join("mypkg")).is_err());

        assert_eq!(linker.link_package(&pkg, true), LinkOutcome::Linked);
        assert_eq!(fs::read_link(site.join("mypkg")).unwrap(), pkg);
    }

    #[test]
    fn test_build_bazel_marker_also_skips() {
        let temp = TempDir::new().unwrap();
        let (linker, _site) = linker(&temp);
        let pkg = temp.path().join("otherpkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("BUILD.bazel"), "").unwrap();

        assert_eq!(
            linker.link_package(&pkg, false),
            LinkOutcome::SkippedBuildManaged
        );
    }

    #[test]
    fn test_relink_is_last_write_wins() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);

        let first = temp.path().join("a/numpy");
        let second = temp.path().join("b/numpy");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();

        assert_eq!(linker.link_package(&first, false), LinkOutcome::Linked);
        assert_eq!(fs::read_link(site.join("numpy")).unwrap(), first);

        assert_eq!(linker.link_package(&second, false), LinkOutcome::Linked);
        assert_eq!(fs::read_link(site.join("numpy")).unwrap(), second);
    }

    #[test]
    fn test_link_replaces_plain_file_at_destination() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);
        let pkg = temp.path().join("six");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(site.join("six"), "stale").unwrap();

        assert_eq!(linker.link_package(&pkg, false), LinkOutcome::Linked);
        assert_eq!(fs::read_link(site.join("six")).unwrap(), pkg);
    }

    #[test]
    fn test_link_replaces_real_directory_at_destination() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);
        let pkg = temp.path().join("attrs");
        fs::create_dir_all(&pkg).unwrap();
        fs::create_dir_all(site.join("attrs/leftover")).unwrap();

        assert_eq!(linker.link_package(&pkg, false), LinkOutcome::Linked);
        assert_eq!(fs::read_link(site.join("attrs")).unwrap(), pkg);
    }

    #[test]
    fn test_external_walk_links_only_depth_three() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);

        let external = temp.path().join("external");
        let z = external.join("foo_pip_bar/x/y/z");
        fs::create_dir_all(&z).unwrap();

        let report = linker.link_external(&external).unwrap();

        assert_eq!(report.linked, vec![z.clone()]);
        assert_eq!(fs::read_link(site.join("z")).unwrap(), z);
        assert!(fs::symlink_metadata(site.join("x")).is_err());
        assert!(fs::symlink_metadata(site.join("y")).is_err());
    }

    #[test]
    fn test_external_walk_ignores_non_pip_repositories() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);

        let external = temp.path().join("external");
        fs::create_dir_all(external.join("rules_go/x/y/z")).unwrap();

        let report = linker.link_external(&external).unwrap();

        assert!(report.linked.is_empty());
        assert!(fs::symlink_metadata(site.join("z")).is_err());
    }

    #[test]
    fn test_external_walk_skips_build_managed_packages() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);

        let external = temp.path().join("external");
        let pkg = external.join("acme_pip_deps/pypi/site/requests");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("BUILD"), "").unwrap();

        let report = linker.link_external(&external).unwrap();

        assert!(report.linked.is_empty());
        assert_eq!(report.skipped, 1);
        assert!(fs::symlink_metadata(site.join("requests")).is_err());
    }

    #[test]
    fn test_libraries_walk_links_src_packages() {
        let temp = TempDir::new().unwrap();
        let (linker, site) = linker(&temp);

        let execroot = temp.path().join("execroot");
        let pkg = execroot.join("python/libraries/mylib/src/mypkg");
        fs::create_dir_all(&pkg).unwrap();
        // First-party source trees carry build files but are linked anyway.
        fs::write(pkg.join("BUILD"), "").unwrap();

        let report = linker.link_libraries(&execroot).unwrap();

        assert_eq!(report.linked, vec![pkg.clone()]);
        assert_eq!(fs::read_link(site.join("mypkg")).unwrap(), pkg);
    }

    #[test]
    fn test_libraries_walk_requires_src_subdirectory() {
        let temp = TempDir::new().unwrap();
        let (linker, _site) = linker(&temp);

        let execroot = temp.path().join("execroot");
        fs::create_dir_all(execroot.join("python/libraries/mylib/notsrc/pkg")).unwrap();

        let report = linker.link_libraries(&execroot).unwrap();
        assert!(report.linked.is_empty());
    }

    #[test]
    fn test_libraries_walk_tolerates_missing_tree() {
        let temp = TempDir::new().unwrap();
        let (linker, _site) = linker(&temp);

        let report = linker.link_libraries(temp.path()).unwrap();
        assert!(report.linked.is_empty());
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_report_merge() {
        let mut a = LinkReport::default();
        a.record(Path::new("/x/one"), LinkOutcome::Linked);
        let mut b = LinkReport::default();
        b.record(Path::new("/x/two"), LinkOutcome::SkippedReserved);
        b.record(Path::new("/x/three"), LinkOutcome::Failed("boom".into()));

        a.merge(b);
        assert_eq!(a.linked.len(), 1);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.failed.len(), 1);
    }
}
