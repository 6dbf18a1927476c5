use std::fs;
use std::path::{Path, PathBuf};

use crate::fs_tree::{copy_tree, remove_tree, CopyReport};
use crate::path_guard::is_safe_subpath;
use crate::traits::{ArchiveStore, RetainedStore, StorageError, StorageResult};

/// Local filesystem archive store
///
/// Stands in for a remote destination: archives are plain directory trees
/// under `archive_root/<destination>/<folder>`.
#[derive(Clone, Debug)]
pub struct LocalArchiveStore {
    archive_root: PathBuf,
}

impl LocalArchiveStore {
    /// Create a store rooted at `archive_root`.
    ///
    /// Nothing is created on disk until the first `store_tree`, so a dry run
    /// leaves the filesystem untouched.
    pub fn new(archive_root: impl Into<PathBuf>) -> Self {
        Self {
            archive_root: archive_root.into(),
        }
    }

    fn ensure_confined(&self, target: &Path) -> StorageResult<()> {
        if is_safe_subpath(&self.archive_root, target) {
            Ok(())
        } else {
            Err(StorageError::UnsafePath {
                path: target.to_path_buf(),
                root: self.archive_root.clone(),
            })
        }
    }

    /// Ensure parent directory exists
    fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl ArchiveStore for LocalArchiveStore {
    fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    fn target_path(&self, destination: &str, folder_name: &str) -> StorageResult<PathBuf> {
        let target = self.archive_root.join(destination).join(folder_name);
        self.ensure_confined(&target)?;
        Ok(target)
    }

    fn exists(&self, target: &Path) -> bool {
        fs::symlink_metadata(target).is_ok()
    }

    fn store_tree(&self, source: &Path, target: &Path) -> StorageResult<CopyReport> {
        self.ensure_confined(target)?;
        self.ensure_parent_dir(target)?;

        if self.exists(target) {
            return Err(StorageError::TargetExists(target.to_path_buf()));
        }

        let start = std::time::Instant::now();
        let report = copy_tree(source, target)?;

        tracing::info!(
            source = %source.display(),
            target = %target.display(),
            files = report.files_copied,
            bytes = report.bytes_copied,
            duration_ms = start.elapsed().as_millis() as u64,
            "Archive copy successful"
        );

        Ok(report)
    }
}

/// Retained folders on the local filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalRetainedStore;

impl RetainedStore for LocalRetainedStore {
    fn remove_folder(&self, folder: &Path) -> StorageResult<()> {
        remove_tree(folder)
    }
}
