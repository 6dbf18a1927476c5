//! Error types module
//!
//! `ArchivistError` covers failures that are not tied to one specific folder
//! (configuration, manifest (de)serialization, audit storage). Verification
//! problems get their own type, `VerificationFailure`, so that every failed
//! check keeps a distinguishable reason even though the pipeline only cares
//! about pass/fail.

use std::io;
use std::path::PathBuf;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected conditions
    Debug,
    /// Warning level - for per-folder failures the run recovers from
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-describing metadata for errors that end up in audit records
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "DIGEST_MISMATCH")
    fn error_code(&self) -> &'static str;

    /// Whether the next scheduled run can be expected to succeed without
    /// operator intervention
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the operator
    fn suggested_action(&self) -> Option<&'static str>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ArchivistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error for {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Audit write failed: {0}")]
    Audit(String),
}

pub type ArchivistResult<T> = Result<T, ArchivistError>;

impl ErrorMetadata for ArchivistError {
    fn error_code(&self) -> &'static str {
        match self {
            ArchivistError::Io(_) => "IO_ERROR",
            ArchivistError::Serialization(_) => "SERIALIZATION_ERROR",
            ArchivistError::Config(_) => "CONFIG_ERROR",
            ArchivistError::Manifest { .. } => "MANIFEST_ERROR",
            ArchivistError::Audit(_) => "AUDIT_WRITE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ArchivistError::Io(_) | ArchivistError::Manifest { .. } | ArchivistError::Audit(_)
        )
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            ArchivistError::Io(_) | ArchivistError::Manifest { .. } => {
                Some("Check permissions on the retained folder; it will be retried next run")
            }
            ArchivistError::Config(_) => Some("Fix the ARCHIVIST_* settings and rerun"),
            ArchivistError::Audit(_) => Some("Check free space and permissions of the log directory"),
            ArchivistError::Serialization(_) => None,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ArchivistError::Config(_) | ArchivistError::Serialization(_) => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

/// Why an archived copy was not accepted.
///
/// Paths are manifest-relative (posix style).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    /// The source changed under us between manifest creation and verification
    #[error("Source file missing unexpectedly: {path}")]
    SourceMissing { path: String },

    /// A source file was rewritten after its manifest entry was recorded
    #[error("Source file changed since the manifest was built: {path} ({reason})")]
    SourceChanged { path: String, reason: String },

    /// A source file appeared after the manifest was built; it has no copy
    #[error("Source file not in manifest: {path}")]
    UnexpectedSourceFile { path: String },

    /// A symlink or special file in the source; it is never archived
    #[error("Source entry cannot be archived (symlink or special file): {path}")]
    UnsupportedSourceEntry { path: String },

    /// The copy is incomplete
    #[error("Missing archived file: {path}")]
    ArchivedMissing { path: String },

    #[error("Size mismatch for {path}: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("Hash mismatch for {path}: expected {expected}, found {actual}")]
    DigestMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Archived manifest missing")]
    ArchivedManifestMissing,

    #[error("Archived manifest does not match: {reason}")]
    ArchivedManifestMismatch { reason: String },
}

impl VerificationFailure {
    /// The file the failed check was about, if the check was about a file.
    pub fn path(&self) -> Option<&str> {
        match self {
            VerificationFailure::SourceMissing { path }
            | VerificationFailure::SourceChanged { path, .. }
            | VerificationFailure::UnexpectedSourceFile { path }
            | VerificationFailure::UnsupportedSourceEntry { path }
            | VerificationFailure::ArchivedMissing { path }
            | VerificationFailure::SizeMismatch { path, .. }
            | VerificationFailure::DigestMismatch { path, .. }
            | VerificationFailure::Unreadable { path, .. } => Some(path),
            VerificationFailure::ArchivedManifestMissing
            | VerificationFailure::ArchivedManifestMismatch { .. } => None,
        }
    }
}

impl ErrorMetadata for VerificationFailure {
    fn error_code(&self) -> &'static str {
        match self {
            VerificationFailure::SourceMissing { .. } => "SOURCE_MISSING",
            VerificationFailure::SourceChanged { .. } => "SOURCE_CHANGED",
            VerificationFailure::UnexpectedSourceFile { .. } => "UNEXPECTED_SOURCE_FILE",
            VerificationFailure::UnsupportedSourceEntry { .. } => "UNSUPPORTED_SOURCE_ENTRY",
            VerificationFailure::ArchivedMissing { .. } => "ARCHIVED_FILE_MISSING",
            VerificationFailure::SizeMismatch { .. } => "SIZE_MISMATCH",
            VerificationFailure::DigestMismatch { .. } => "DIGEST_MISMATCH",
            VerificationFailure::Unreadable { .. } => "UNREADABLE",
            VerificationFailure::ArchivedManifestMissing => "ARCHIVED_MANIFEST_MISSING",
            VerificationFailure::ArchivedManifestMismatch { .. } => "ARCHIVED_MANIFEST_MISMATCH",
        }
    }

    fn is_recoverable(&self) -> bool {
        // A retry re-hashes the source, so a race with the producer heals itself;
        // a corrupt copy needs the stale archive target removed first.
        matches!(
            self,
            VerificationFailure::SourceMissing { .. }
                | VerificationFailure::SourceChanged { .. }
                | VerificationFailure::UnexpectedSourceFile { .. }
                | VerificationFailure::Unreadable { .. }
        )
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            VerificationFailure::SourceMissing { .. }
            | VerificationFailure::SourceChanged { .. }
            | VerificationFailure::UnexpectedSourceFile { .. } => {
                Some("Make sure nothing writes to expired folders during archival")
            }
            VerificationFailure::UnsupportedSourceEntry { .. } => {
                Some("Replace symlinks and special files with regular files, or remove them")
            }
            VerificationFailure::Unreadable { .. } => Some("Check file permissions"),
            _ => Some("Inspect and remove the partial archive target before the next run"),
        }
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Warn
    }
}
