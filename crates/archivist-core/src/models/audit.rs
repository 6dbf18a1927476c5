use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::TIMESTAMP_FORMAT;
use crate::error::ArchivistResult;

/// Every kind of record the audit trail can contain
///
/// Variant names match `AuditEvent` one for one; the serialized name of
/// either is the `event` field of an audit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    JobStarted,
    ExpiredFoldersIdentified,
    JobCancelled,
    JobFailedInvalidDestination,
    JobFailedScan,
    ArchiveAttempt,
    ArchiveBlockedUnsafePath,
    ArchiveBlockedUnsupportedEntries,
    ArchiveSimulated,
    ArchiveFailedExists,
    ArchiveVerified,
    ArchiveVerificationFailed,
    ArchiveFailedKeptLocal,
    ArchiveCopyFailed,
    ManifestFailed,
    LocalDeletionSimulated,
    LocalDeleted,
    LocalDeletionBlockedUnsafePath,
    LocalDeletionFailed,
    JobCompleted,
    JobCompletedNoop,
}

/// A pipeline decision together with its event-specific details
///
/// Serializes as `{"event": "<snake_case name>", "details": {..}}`. Events
/// without details are empty struct variants so `details` is always an
/// object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "details", rename_all = "snake_case")]
pub enum AuditEvent {
    JobStarted {
        run_id: String,
        retention_days: u32,
        dry_run: bool,
        output_dir: String,
        archive_dir: String,
    },
    ExpiredFoldersIdentified {
        folders: Vec<String>,
    },
    JobCancelled {},
    JobFailedInvalidDestination {},
    /// The retained-data root could not be listed; nothing was processed
    JobFailedScan {
        output_dir: String,
        reason: String,
    },
    ArchiveAttempt {
        folder: String,
        destination: String,
    },
    ArchiveBlockedUnsafePath {
        source: String,
        archive_target: String,
        destination: String,
    },
    /// The folder holds symlinks or special files, which have no archived
    /// copy; it is kept local untouched
    ArchiveBlockedUnsupportedEntries {
        folder: String,
        destination: String,
        entries: Vec<String>,
    },
    ArchiveSimulated {
        folder: String,
        destination: String,
        archive_target: String,
    },
    ArchiveFailedExists {
        folder: String,
        destination: String,
        archive_target: String,
    },
    ArchiveVerified {
        folder: String,
        destination: String,
        archive_target: String,
        file_count: usize,
    },
    ArchiveVerificationFailed {
        folder: String,
        destination: String,
        archive_target: String,
        code: String,
        reason: String,
        path: Option<String>,
    },
    ArchiveFailedKeptLocal {
        folder: String,
        destination: String,
    },
    ArchiveCopyFailed {
        folder: String,
        destination: String,
        archive_target: String,
        reason: String,
    },
    ManifestFailed {
        folder: String,
        destination: String,
        reason: String,
    },
    LocalDeletionSimulated {
        folder: String,
    },
    LocalDeleted {
        folder: String,
        destination: String,
    },
    LocalDeletionBlockedUnsafePath {
        folder: String,
        output_dir: String,
    },
    LocalDeletionFailed {
        folder: String,
        destination: String,
        reason: String,
    },
    JobCompleted {
        archived: usize,
        kept_local: usize,
        deletion_failures: usize,
    },
    JobCompletedNoop {},
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub event: AuditEventKind,
    #[serde(default)]
    pub details: Value,
}

impl AuditRecord {
    pub fn new(at: NaiveDateTime, event: &AuditEvent) -> ArchivistResult<Self> {
        let mut line = serde_json::to_value(event)?;
        if let Some(fields) = line.as_object_mut() {
            fields.insert(
                "timestamp".to_string(),
                Value::String(at.format(TIMESTAMP_FORMAT).to_string()),
            );
        }
        Ok(serde_json::from_value(line)?)
    }

    /// Stamp an event with the current local time
    pub fn now(event: &AuditEvent) -> ArchivistResult<Self> {
        Self::new(chrono::Local::now().naive_local(), event)
    }

    /// Read a string field out of the details, if present
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }
}
