//! Stores that misbehave around an otherwise successful copy or removal.

use std::fs;
use std::path::{Path, PathBuf};

use archivist_storage::{
    ArchiveStore, CopyReport, LocalArchiveStore, LocalRetainedStore, RetainedStore, StorageError,
    StorageResult,
};

/// What to do around the local store's copy of the tree
#[derive(Clone, Debug)]
pub enum Fault {
    /// Flip the last byte of this archived file
    CorruptArchived(String),
    /// Remove this archived file
    DropArchived(String),
    /// Remove this source file (the producer racing the pipeline)
    DropSource(String),
    /// Overwrite this source file with same-sized different bytes
    ModifySource(String),
    /// Create this source file, which the manifest does not list
    AddSource(String),
    /// Report a copy failure without copying anything
    FailCopy,
}

pub struct FaultyStore {
    inner: LocalArchiveStore,
    fault: Fault,
    only: Option<String>,
}

impl FaultyStore {
    pub fn new(archive_root: impl Into<PathBuf>, fault: Fault) -> Self {
        Self {
            inner: LocalArchiveStore::new(archive_root),
            fault,
            only: None,
        }
    }

    /// Misbehave for this folder only; every other folder copies normally
    pub fn for_folder(mut self, name: &str) -> Self {
        self.only = Some(name.to_string());
        self
    }

    fn applies_to(&self, source: &Path) -> bool {
        match &self.only {
            Some(name) => source.file_name().is_some_and(|n| n == name.as_str()),
            None => true,
        }
    }
}

impl ArchiveStore for FaultyStore {
    fn archive_root(&self) -> &Path {
        self.inner.archive_root()
    }

    fn target_path(&self, destination: &str, folder_name: &str) -> StorageResult<PathBuf> {
        self.inner.target_path(destination, folder_name)
    }

    fn exists(&self, target: &Path) -> bool {
        self.inner.exists(target)
    }

    fn store_tree(&self, source: &Path, target: &Path) -> StorageResult<CopyReport> {
        if !self.applies_to(source) {
            return self.inner.store_tree(source, target);
        }
        if let Fault::FailCopy = self.fault {
            return Err(StorageError::CopyFailed(format!(
                "Failed to copy {}: destination unreachable",
                source.display()
            )));
        }

        let report = self.inner.store_tree(source, target)?;
        match &self.fault {
            Fault::CorruptArchived(relative) => {
                let path = target.join(relative);
                let mut bytes = fs::read(&path)?;
                if let Some(last) = bytes.last_mut() {
                    *last ^= 0x01;
                }
                fs::write(&path, bytes)?;
            }
            Fault::DropArchived(relative) => fs::remove_file(target.join(relative))?,
            Fault::DropSource(relative) => fs::remove_file(source.join(relative))?,
            Fault::ModifySource(relative) => fs::write(source.join(relative), b"9876543210")?,
            Fault::AddSource(relative) => fs::write(source.join(relative), b"late arrival")?,
            Fault::FailCopy => {}
        }
        Ok(report)
    }
}

/// Removes retained folders normally, except the named one
pub struct FailingRemover {
    folder: String,
}

impl FailingRemover {
    pub fn new(folder: &str) -> Self {
        Self {
            folder: folder.to_string(),
        }
    }
}

impl RetainedStore for FailingRemover {
    fn remove_folder(&self, folder: &Path) -> StorageResult<()> {
        if folder.file_name().is_some_and(|n| n == self.folder.as_str()) {
            return Err(StorageError::DeleteFailed(format!(
                "Failed to remove {}: Resource busy",
                folder.display()
            )));
        }
        LocalRetainedStore.remove_folder(folder)
    }
}
