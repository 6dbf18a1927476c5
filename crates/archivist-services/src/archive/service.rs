use std::path::{Path, PathBuf};
use std::sync::Arc;

use archivist_core::error::ErrorMetadata;
use archivist_core::{
    ArchivistConfig, AuditEvent, Destination, Manifest, RetainedFolder, VerificationFailure,
};
use archivist_storage::{ArchiveStore, StorageError};

use crate::audit::AuditTrail;
use crate::manifest::ManifestEngine;

/// Proof that a folder's archive was copied and verified (or, under dry run,
/// that it would have been).
///
/// Only `ArchiveTransfer` can produce one, and `DeletionGuard` consumes it, so
/// a local folder cannot be handed to deletion without a successful transfer.
#[derive(Debug)]
pub struct VerifiedArchive {
    folder: RetainedFolder,
    destination: Destination,
    archive_target: PathBuf,
    file_count: usize,
    simulated: bool,
}

impl VerifiedArchive {
    pub(crate) fn new(
        folder: RetainedFolder,
        destination: Destination,
        archive_target: PathBuf,
        file_count: usize,
        simulated: bool,
    ) -> Self {
        Self {
            folder,
            destination,
            archive_target,
            file_count,
            simulated,
        }
    }

    pub fn folder(&self) -> &RetainedFolder {
        &self.folder
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn archive_target(&self) -> &Path {
        &self.archive_target
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// True when produced by a dry run; nothing was copied.
    pub fn is_simulated(&self) -> bool {
        self.simulated
    }
}

/// Result of archiving one folder
#[derive(Debug)]
pub enum TransferOutcome {
    Verified(VerifiedArchive),
    Simulated(VerifiedArchive),
    BlockedUnsafePath { archive_target: PathBuf },
    /// Symlinks or special files found; nothing was copied
    BlockedUnsupportedEntries { entries: Vec<String> },
    TargetExists { archive_target: PathBuf },
    CopyFailed { archive_target: PathBuf, reason: String },
    VerificationFailed {
        archive_target: PathBuf,
        failure: VerificationFailure,
    },
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TransferOutcome::Verified(_) | TransferOutcome::Simulated(_)
        )
    }

    /// The verification token, if the transfer succeeded
    pub fn into_verified(self) -> Option<VerifiedArchive> {
        match self {
            TransferOutcome::Verified(archive) | TransferOutcome::Simulated(archive) => {
                Some(archive)
            }
            _ => None,
        }
    }

    /// Short description of why the transfer did not succeed
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            TransferOutcome::Verified(_) | TransferOutcome::Simulated(_) => None,
            TransferOutcome::BlockedUnsafePath { archive_target } => Some(format!(
                "archive target {} escapes the archive root",
                archive_target.display()
            )),
            TransferOutcome::BlockedUnsupportedEntries { entries } => Some(format!(
                "folder holds entries that cannot be archived: {}",
                entries.join(", ")
            )),
            TransferOutcome::TargetExists { archive_target } => Some(format!(
                "archive target {} already exists",
                archive_target.display()
            )),
            TransferOutcome::CopyFailed { reason, .. } => Some(reason.clone()),
            TransferOutcome::VerificationFailed { failure, .. } => Some(failure.to_string()),
        }
    }
}

/// Copies expired folders into the archive store and verifies the copy
#[derive(Clone)]
pub struct ArchiveTransfer {
    store: Arc<dyn ArchiveStore>,
    manifests: ManifestEngine,
    audit: AuditTrail,
    dry_run: bool,
}

impl ArchiveTransfer {
    pub fn new(config: &ArchivistConfig, store: Arc<dyn ArchiveStore>, audit: AuditTrail) -> Self {
        Self {
            store,
            manifests: ManifestEngine::new(config),
            audit,
            dry_run: config.dry_run,
        }
    }

    /// Archive `folder` to `archive_root/<destination>/<folder>` and verify
    /// the copy against `manifest`.
    ///
    /// The manifest must already have been written into the folder so that
    /// the copy carries it.
    #[tracing::instrument(skip_all, fields(folder = %folder.name, destination = %destination))]
    pub fn transfer(
        &self,
        folder: &RetainedFolder,
        destination: &Destination,
        manifest: &Manifest,
    ) -> TransferOutcome {
        let archive_target = match self.store.target_path(destination.as_str(), &folder.name) {
            Ok(target) => target,
            Err(e) => {
                let attempted = self
                    .store
                    .archive_root()
                    .join(destination.as_str())
                    .join(&folder.name);
                tracing::error!(
                    error = %e,
                    archive_target = %attempted.display(),
                    "Unsafe archive target, refusing to archive"
                );
                self.audit.record(AuditEvent::ArchiveBlockedUnsafePath {
                    source: folder.path.display().to_string(),
                    archive_target: attempted.display().to_string(),
                    destination: destination.to_string(),
                });
                return TransferOutcome::BlockedUnsafePath {
                    archive_target: attempted,
                };
            }
        };

        // Skipped entries have no archived copy
        if !manifest.skipped.is_empty() {
            tracing::error!(
                entries = ?manifest.skipped,
                "Folder holds symlinks or special files, keeping it local"
            );
            self.audit.record(AuditEvent::ArchiveBlockedUnsupportedEntries {
                folder: folder.name.clone(),
                destination: destination.to_string(),
                entries: manifest.skipped.clone(),
            });
            return TransferOutcome::BlockedUnsupportedEntries {
                entries: manifest.skipped.clone(),
            };
        }

        if self.dry_run {
            tracing::info!(
                archive_target = %archive_target.display(),
                "[DRY RUN] Would archive folder"
            );
            self.audit.record(AuditEvent::ArchiveSimulated {
                folder: folder.name.clone(),
                destination: destination.to_string(),
                archive_target: archive_target.display().to_string(),
            });
            return TransferOutcome::Simulated(VerifiedArchive::new(
                folder.clone(),
                destination.clone(),
                archive_target,
                manifest.file_count(),
                true,
            ));
        }

        if self.store.exists(&archive_target) {
            return self.target_exists(folder, destination, archive_target);
        }

        match self.store.store_tree(&folder.path, &archive_target) {
            Ok(_) => {}
            Err(StorageError::TargetExists(_)) => {
                return self.target_exists(folder, destination, archive_target);
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    error_code = e.error_code(),
                    archive_target = %archive_target.display(),
                    "Archive copy failed"
                );
                self.audit.record(AuditEvent::ArchiveCopyFailed {
                    folder: folder.name.clone(),
                    destination: destination.to_string(),
                    archive_target: archive_target.display().to_string(),
                    reason: e.to_string(),
                });
                return TransferOutcome::CopyFailed {
                    archive_target,
                    reason: e.to_string(),
                };
            }
        }

        match self
            .manifests
            .verify(&folder.path, &archive_target, manifest)
        {
            Ok(()) => {
                tracing::info!(
                    archive_target = %archive_target.display(),
                    files = manifest.file_count(),
                    "Archive verified"
                );
                self.audit.record(AuditEvent::ArchiveVerified {
                    folder: folder.name.clone(),
                    destination: destination.to_string(),
                    archive_target: archive_target.display().to_string(),
                    file_count: manifest.file_count(),
                });
                TransferOutcome::Verified(VerifiedArchive::new(
                    folder.clone(),
                    destination.clone(),
                    archive_target,
                    manifest.file_count(),
                    false,
                ))
            }
            Err(failure) => {
                self.audit.record(AuditEvent::ArchiveVerificationFailed {
                    folder: folder.name.clone(),
                    destination: destination.to_string(),
                    archive_target: archive_target.display().to_string(),
                    code: failure.error_code().to_string(),
                    reason: failure.to_string(),
                    path: failure.path().map(str::to_string),
                });
                TransferOutcome::VerificationFailed {
                    archive_target,
                    failure,
                }
            }
        }
    }

    fn target_exists(
        &self,
        folder: &RetainedFolder,
        destination: &Destination,
        archive_target: PathBuf,
    ) -> TransferOutcome {
        tracing::error!(
            archive_target = %archive_target.display(),
            "Archive target already exists, refusing to overwrite"
        );
        self.audit.record(AuditEvent::ArchiveFailedExists {
            folder: folder.name.clone(),
            destination: destination.to_string(),
            archive_target: archive_target.display().to_string(),
        });
        TransferOutcome::TargetExists { archive_target }
    }
}
