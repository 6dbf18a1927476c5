use std::sync::Arc;

use archivist_core::{
    ArchivistConfig, ArchivistResult, AuditEvent, Destination, RetainedFolder,
};
use archivist_storage::{ArchiveStore, LocalArchiveStore, RetainedStore};
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use super::decision::DecisionProvider;
use crate::archive::ArchiveTransfer;
use crate::audit::AuditTrail;
use crate::cleanup::{DeletionGuard, DeletionOutcome};
use crate::manifest::ManifestEngine;
use crate::retention::find_expired;

/// What happened to one expired folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FolderOutcome {
    /// Archived, verified and removed locally
    Archived {
        folder: String,
        archive_target: String,
    },
    /// Dry run: every step was decided and logged, nothing was changed
    Simulated {
        folder: String,
        archive_target: String,
    },
    /// Not archived; the local folder is left for the next run
    KeptLocal { folder: String, reason: String },
    /// Archived and verified, but the local folder could not be removed
    DeletionFailed {
        folder: String,
        archive_target: String,
        reason: String,
    },
}

impl FolderOutcome {
    pub fn folder(&self) -> &str {
        match self {
            FolderOutcome::Archived { folder, .. }
            | FolderOutcome::Simulated { folder, .. }
            | FolderOutcome::KeptLocal { folder, .. }
            | FolderOutcome::DeletionFailed { folder, .. } => folder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub destination: Destination,
    pub dry_run: bool,
    pub folders: Vec<FolderOutcome>,
}

impl RunSummary {
    /// Folders whose archive was verified (or simulated under dry run)
    pub fn archived(&self) -> usize {
        self.folders
            .iter()
            .filter(|f| {
                matches!(
                    f,
                    FolderOutcome::Archived { .. } | FolderOutcome::Simulated { .. }
                )
            })
            .count()
    }

    pub fn kept_local(&self) -> usize {
        self.folders
            .iter()
            .filter(|f| matches!(f, FolderOutcome::KeptLocal { .. }))
            .count()
    }

    pub fn deletion_failures(&self) -> usize {
        self.folders
            .iter()
            .filter(|f| matches!(f, FolderOutcome::DeletionFailed { .. }))
            .count()
    }

    /// True when every folder was archived and removed (or simulated)
    pub fn is_clean(&self) -> bool {
        self.archived() == self.folders.len()
    }
}

/// How one invocation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "summary", rename_all = "snake_case")]
pub enum RunOutcome {
    NothingExpired,
    Cancelled,
    InvalidDestination,
    Completed(RunSummary),
}

/// Sequences scan, confirmation, manifest, transfer, verification and
/// deletion for every expired folder
pub struct Pipeline {
    config: ArchivistConfig,
    manifests: ManifestEngine,
    transfer: ArchiveTransfer,
    deletion: DeletionGuard,
    audit: AuditTrail,
}

impl Pipeline {
    pub fn new(config: &ArchivistConfig, store: Arc<dyn ArchiveStore>, audit: AuditTrail) -> Self {
        Self {
            config: config.clone(),
            manifests: ManifestEngine::new(config),
            transfer: ArchiveTransfer::new(config, store, audit.clone()),
            deletion: DeletionGuard::new(config, audit.clone()),
            audit,
        }
    }

    /// Pipeline archiving to the local archive root with the JSON Lines audit
    /// log under the configured log directory
    pub fn local(config: &ArchivistConfig) -> Self {
        Self::new(
            config,
            Arc::new(LocalArchiveStore::new(&config.archive_dir)),
            AuditTrail::jsonl(config.audit_log_path()),
        )
    }

    /// Remove verified local folders through `store` instead of the local
    /// filesystem
    pub fn with_retained_store(mut self, store: Arc<dyn RetainedStore>) -> Self {
        self.deletion = DeletionGuard::with_store(&self.config, store, self.audit.clone());
        self
    }

    pub fn run(&self, decisions: &dyn DecisionProvider) -> ArchivistResult<RunOutcome> {
        self.run_at(chrono::Local::now().naive_local(), decisions)
    }

    /// Run one pass with an explicit clock.
    ///
    /// Only a failing scan returns an error; per-folder failures are reported
    /// in the summary and never stop the run.
    pub fn run_at(
        &self,
        now: NaiveDateTime,
        decisions: &dyn DecisionProvider,
    ) -> ArchivistResult<RunOutcome> {
        let run_id = Uuid::new_v4().to_string();

        tracing::info!(
            run_id = %run_id,
            retention_days = self.config.retention_days,
            dry_run = self.config.dry_run,
            "Archival job started"
        );
        self.audit.record(AuditEvent::JobStarted {
            run_id: run_id.clone(),
            retention_days: self.config.retention_days,
            dry_run: self.config.dry_run,
            output_dir: self.config.output_dir.display().to_string(),
            archive_dir: self.config.archive_dir.display().to_string(),
        });

        let expired = match find_expired(
            &self.config.output_dir,
            self.config.retention_days,
            now.date(),
        ) {
            Ok(expired) => expired,
            Err(e) => {
                tracing::error!(error = %e, "Expiration scan failed");
                self.audit.record(AuditEvent::JobFailedScan {
                    output_dir: self.config.output_dir.display().to_string(),
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        if expired.is_empty() {
            tracing::info!("No expired data found");
            self.audit.record(AuditEvent::JobCompletedNoop {});
            return Ok(RunOutcome::NothingExpired);
        }

        let names: Vec<String> = expired.iter().map(|f| f.name.clone()).collect();
        tracing::info!(folders = ?names, "Folders eligible for archival");
        self.audit
            .record(AuditEvent::ExpiredFoldersIdentified { folders: names });

        if !decisions.confirm_proceed(&expired) {
            tracing::info!("Operation cancelled");
            self.audit.record(AuditEvent::JobCancelled {});
            return Ok(RunOutcome::Cancelled);
        }

        let Some(destination) = decisions.choose_destination() else {
            tracing::error!("Invalid destination selected");
            self.audit.record(AuditEvent::JobFailedInvalidDestination {});
            return Ok(RunOutcome::InvalidDestination);
        };

        let folders = expired
            .iter()
            .map(|folder| self.process_folder(folder, &destination))
            .collect();

        let summary = RunSummary {
            run_id,
            destination,
            dry_run: self.config.dry_run,
            folders,
        };

        tracing::info!(
            archived = summary.archived(),
            kept_local = summary.kept_local(),
            deletion_failures = summary.deletion_failures(),
            "Archival job completed"
        );
        self.audit.record(AuditEvent::JobCompleted {
            archived: summary.archived(),
            kept_local: summary.kept_local(),
            deletion_failures: summary.deletion_failures(),
        });

        Ok(RunOutcome::Completed(summary))
    }

    /// Manifest, transfer, verify and delete one folder
    #[tracing::instrument(skip_all, fields(folder = %folder.name, destination = %destination))]
    pub fn process_folder(
        &self,
        folder: &RetainedFolder,
        destination: &Destination,
    ) -> FolderOutcome {
        tracing::info!("Processing folder");
        self.audit.record(AuditEvent::ArchiveAttempt {
            folder: folder.name.clone(),
            destination: destination.to_string(),
        });

        let manifest = match self
            .manifests
            .build(&folder.path)
            .and_then(|manifest| {
                self.manifests.write(&folder.path, &manifest)?;
                Ok(manifest)
            }) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::error!(error = %e, "Manifest could not be prepared");
                self.audit.record(AuditEvent::ManifestFailed {
                    folder: folder.name.clone(),
                    destination: destination.to_string(),
                    reason: e.to_string(),
                });
                return self.kept_local(folder, destination, e.to_string());
            }
        };

        let outcome = self.transfer.transfer(folder, destination, &manifest);
        let failure_reason = outcome.failure_reason();

        let Some(archive) = outcome.into_verified() else {
            let reason = failure_reason.unwrap_or_else(|| "archive failed".to_string());
            return self.kept_local(folder, destination, reason);
        };

        let archive_target = archive.archive_target().display().to_string();
        match self.deletion.delete_verified(archive) {
            DeletionOutcome::Deleted => FolderOutcome::Archived {
                folder: folder.name.clone(),
                archive_target,
            },
            DeletionOutcome::Simulated => FolderOutcome::Simulated {
                folder: folder.name.clone(),
                archive_target,
            },
            DeletionOutcome::BlockedUnsafePath => FolderOutcome::DeletionFailed {
                folder: folder.name.clone(),
                archive_target,
                reason: "folder is not confined to the retained-data root".to_string(),
            },
            DeletionOutcome::Failed { reason } => FolderOutcome::DeletionFailed {
                folder: folder.name.clone(),
                archive_target,
                reason,
            },
        }
    }

    fn kept_local(
        &self,
        folder: &RetainedFolder,
        destination: &Destination,
        reason: String,
    ) -> FolderOutcome {
        tracing::error!(reason = %reason, "Archive failed or could not be verified, keeping local copy");
        self.audit.record(AuditEvent::ArchiveFailedKeptLocal {
            folder: folder.name.clone(),
            destination: destination.to_string(),
        });
        FolderOutcome::KeptLocal {
            folder: folder.name.clone(),
            reason,
        }
    }
}
