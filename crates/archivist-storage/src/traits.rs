//! Storage abstraction trait
//!
//! This module defines the `ArchiveStore` trait that archive backends implement,
//! the `RetainedStore` trait for the retained-data side, and the error type
//! shared by every storage primitive.

use std::path::{Path, PathBuf};

use archivist_core::error::{ErrorMetadata, LogLevel};
use thiserror::Error;

use crate::fs_tree::CopyReport;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Path {path} is not confined to {root}")]
    UnsafePath { path: PathBuf, root: PathBuf },

    #[error("Archive target already exists: {0}")]
    TargetExists(PathBuf),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl ErrorMetadata for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            StorageError::UnsafePath { .. } => "UNSAFE_PATH",
            StorageError::TargetExists(_) => "TARGET_EXISTS",
            StorageError::NotFound(_) => "NOT_FOUND",
            StorageError::ReadFailed(_) => "READ_FAILED",
            StorageError::CopyFailed(_) => "COPY_FAILED",
            StorageError::DeleteFailed(_) => "DELETE_FAILED",
            StorageError::IoError(_) => "IO_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            StorageError::UnsafePath { .. } | StorageError::TargetExists(_)
        )
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            StorageError::UnsafePath { .. } => {
                Some("Check the destination name and any symlinks under the configured roots")
            }
            StorageError::TargetExists(_) => {
                Some("Inspect the existing archive; remove it only if it is known to be incomplete")
            }
            _ => None,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            StorageError::UnsafePath { .. } => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

/// Archive storage abstraction
///
/// An archive store owns one archive root. Archived folders live at
/// `root/<destination>/<folder>`; a target path is never reused.
pub trait ArchiveStore: Send + Sync {
    /// Root directory every archive target must be confined to
    fn archive_root(&self) -> &Path;

    /// Compute the archive target for a folder, rejecting destinations that
    /// would place it outside the archive root
    fn target_path(&self, destination: &str, folder_name: &str) -> StorageResult<PathBuf>;

    /// Whether anything (file, directory or link) already occupies `target`
    fn exists(&self, target: &Path) -> bool;

    /// Copy the `source` tree to `target`, creating parent directories as
    /// needed. Fails with `TargetExists` without copying if `target` exists.
    fn store_tree(&self, source: &Path, target: &Path) -> StorageResult<CopyReport>;
}

/// Retained-data storage abstraction
///
/// Removal of a local folder once its archive has been verified. Callers
/// confine `folder` to the retained-data root before calling.
pub trait RetainedStore: Send + Sync {
    /// Remove the directory tree at `folder` without following symlinks
    fn remove_folder(&self, folder: &Path) -> StorageResult<()>;
}
