use std::path::PathBuf;
use std::sync::Arc;

use archivist_core::error::ErrorMetadata;
use archivist_core::{ArchivistConfig, AuditEvent};
use archivist_storage::{is_safe_subpath, LocalRetainedStore, RetainedStore};

use crate::archive::VerifiedArchive;
use crate::audit::AuditTrail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    Simulated,
    BlockedUnsafePath,
    Failed { reason: String },
}

/// Removes local folders whose archive has been verified
///
/// The folder path is checked against the retained-data root again before
/// anything is removed, whatever the caller has checked already.
#[derive(Clone)]
pub struct DeletionGuard {
    output_dir: PathBuf,
    dry_run: bool,
    store: Arc<dyn RetainedStore>,
    audit: AuditTrail,
}

impl DeletionGuard {
    pub fn new(config: &ArchivistConfig, audit: AuditTrail) -> Self {
        Self::with_store(config, Arc::new(LocalRetainedStore), audit)
    }

    pub fn with_store(
        config: &ArchivistConfig,
        store: Arc<dyn RetainedStore>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            dry_run: config.dry_run,
            store,
            audit,
        }
    }

    #[tracing::instrument(skip_all, fields(folder = %archive.folder().name))]
    pub fn delete_verified(&self, archive: VerifiedArchive) -> DeletionOutcome {
        let folder = archive.folder();

        if !is_safe_subpath(&self.output_dir, &folder.path) {
            tracing::error!(
                path = %folder.path.display(),
                output_dir = %self.output_dir.display(),
                "Refusing to delete folder outside the retained-data root"
            );
            self.audit.record(AuditEvent::LocalDeletionBlockedUnsafePath {
                folder: folder.name.clone(),
                output_dir: self.output_dir.display().to_string(),
            });
            return DeletionOutcome::BlockedUnsafePath;
        }

        if self.dry_run || archive.is_simulated() {
            tracing::info!(path = %folder.path.display(), "[DRY RUN] Would delete local folder");
            self.audit.record(AuditEvent::LocalDeletionSimulated {
                folder: folder.name.clone(),
            });
            return DeletionOutcome::Simulated;
        }

        match self.store.remove_folder(&folder.path) {
            Ok(()) => {
                tracing::info!(
                    path = %folder.path.display(),
                    destination = %archive.destination(),
                    "Local folder deleted after verified archive"
                );
                self.audit.record(AuditEvent::LocalDeleted {
                    folder: folder.name.clone(),
                    destination: archive.destination().to_string(),
                });
                DeletionOutcome::Deleted
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    error_code = e.error_code(),
                    path = %folder.path.display(),
                    "Failed to delete local folder, leaving it in place"
                );
                self.audit.record(AuditEvent::LocalDeletionFailed {
                    folder: folder.name.clone(),
                    destination: archive.destination().to_string(),
                    reason: e.to_string(),
                });
                DeletionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for DeletionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeletionGuard")
            .field("output_dir", &self.output_dir)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}
