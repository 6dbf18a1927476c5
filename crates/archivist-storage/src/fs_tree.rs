//! Directory tree traversal, copy and removal
//!
//! None of these functions follow symbolic links.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::traits::{StorageError, StorageResult};

/// A regular file found by `walk_files`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    /// Root-relative, `/`-separated
    pub relative: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeListing {
    /// Regular files, sorted by relative path
    pub files: Vec<TreeFile>,
    /// Root-relative paths of symlinks and special files
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub skipped: Vec<String>,
}

/// Convert a root-relative path to `/`-separated form.
///
/// Non-UTF-8 names cannot round-trip through a manifest and are rejected.
pub fn relative_posix(root: &Path, path: &Path) -> StorageResult<String> {
    let relative = path.strip_prefix(root).map_err(|_| StorageError::UnsafePath {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str().ok_or_else(|| {
                StorageError::ReadFailed(format!("Non UTF-8 file name: {}", path.display()))
            })?),
            _ => {
                return Err(StorageError::UnsafePath {
                    path: path.to_path_buf(),
                    root: root.to_path_buf(),
                })
            }
        }
    }
    Ok(parts.join("/"))
}

/// Inverse of `relative_posix`.
pub fn join_posix(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

fn walk_error(err: walkdir::Error) -> StorageError {
    let path = err
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    StorageError::ReadFailed(format!("Failed to walk {}: {}", path, err))
}

fn walker(root: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
}

/// Enumerate every regular file under `root`.
///
/// A top-level entry named `exclude_top_level` is left out entirely (used for
/// the manifest file itself). Symlinks and special files are reported in
/// `skipped` and logged.
pub fn walk_files(root: &Path, exclude_top_level: Option<&str>) -> StorageResult<TreeListing> {
    let mut listing = TreeListing::default();

    for entry in walker(root) {
        let entry = entry.map_err(walk_error)?;

        if entry.depth() == 1
            && exclude_top_level.is_some_and(|name| entry.file_name() == name)
        {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let relative = relative_posix(root, entry.path())?;
        if file_type.is_file() {
            listing.files.push(TreeFile {
                relative,
                path: entry.into_path(),
            });
        } else {
            tracing::warn!(
                path = %entry.path().display(),
                symlink = file_type.is_symlink(),
                "Skipping non-regular file"
            );
            listing.skipped.push(relative);
        }
    }

    listing.files.sort_by(|a, b| a.relative.cmp(&b.relative));
    listing.skipped.sort();
    Ok(listing)
}

/// Recursively copy `source` to `target`.
///
/// `target` itself must not exist; its parent must. Directories and regular
/// files are recreated; symlinks and special files are skipped.
pub fn copy_tree(source: &Path, target: &Path) -> StorageResult<CopyReport> {
    fs::create_dir(target).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => StorageError::TargetExists(target.to_path_buf()),
        _ => StorageError::CopyFailed(format!(
            "Failed to create {}: {}",
            target.display(),
            e
        )),
    })?;

    let mut report = CopyReport::default();

    for entry in walker(source) {
        let entry = entry.map_err(|e| StorageError::CopyFailed(walk_error(e).to_string()))?;
        let relative = entry.path().strip_prefix(source).map_err(|_| {
            StorageError::CopyFailed(format!(
                "Entry {} escaped {}",
                entry.path().display(),
                source.display()
            ))
        })?;
        let destination = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir(&destination).map_err(|e| {
                StorageError::CopyFailed(format!(
                    "Failed to create {}: {}",
                    destination.display(),
                    e
                ))
            })?;
        } else if file_type.is_file() {
            let bytes = fs::copy(entry.path(), &destination).map_err(|e| {
                StorageError::CopyFailed(format!(
                    "Failed to copy {} to {}: {}",
                    entry.path().display(),
                    destination.display(),
                    e
                ))
            })?;
            report.files_copied += 1;
            report.bytes_copied += bytes;
        } else {
            tracing::warn!(
                path = %entry.path().display(),
                symlink = file_type.is_symlink(),
                "Not copying non-regular file"
            );
            report
                .skipped
                .push(relative.to_string_lossy().replace('\\', "/"));
        }
    }

    Ok(report)
}

/// Recursively remove the directory at `path`.
///
/// Refuses to operate on a symlink; links inside the tree are removed, not
/// followed.
pub fn remove_tree(path: &Path) -> StorageResult<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound(path.to_path_buf()),
        _ => StorageError::DeleteFailed(format!("Failed to stat {}: {}", path.display(), e)),
    })?;

    if !metadata.file_type().is_dir() {
        return Err(StorageError::DeleteFailed(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    fs::remove_dir_all(path).map_err(|e| {
        StorageError::DeleteFailed(format!("Failed to remove {}: {}", path.display(), e))
    })
}
