//! Failure paths: collisions, corrupted or incomplete copies, producer races,
//! unsupported entries, failed copies, manifests and removals, and deletions
//! outside the retained-data root. In every case the local folder must
//! survive and the remaining folders are still processed.
//!
//! Run with: `cargo test -p archivist-services --test integrity_test`

mod helpers;

use std::sync::Arc;

use archivist_core::{ArchivistConfig, AuditEventKind, Destination, RetainedFolder};
use archivist_services::{
    ArchiveTransfer, DeletionGuard, DeletionOutcome, FolderOutcome, ManifestEngine,
    PresetDecisions, RunOutcome, RunSummary,
};
use archivist_storage::LocalArchiveStore;
use helpers::fixtures::{now, seed_folder, ticket};
use helpers::stores::{FailingRemover, Fault, FaultyStore};
use helpers::{assert_in_order, TestWorkspace};

fn approve(destination: &str) -> PresetDecisions {
    PresetDecisions::approve(Destination::new(destination).expect("non-blank destination"))
}

fn completed(outcome: RunOutcome) -> RunSummary {
    match outcome {
        RunOutcome::Completed(summary) => summary,
        other => panic!("expected a completed run, got {:?}", other),
    }
}

fn two_file_folder(ws: &TestWorkspace) {
    seed_folder(
        &ws.config.output_dir,
        "2023-01-01",
        &[
            ("ticket_100000.txt", &b"0123456789"[..]),
            ("ticket_100001.txt", &b"abcdefghij"[..]),
        ],
    );
}

#[test]
fn test_existing_archive_target_is_a_collision() {
    let ws = TestWorkspace::new();
    ticket(&ws.config.output_dir, "2023-01-01");
    let target = ws.archived_folder("remote_server_archive", "2023-01-01");
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("earlier.txt"), b"earlier run").unwrap();

    let summary = completed(
        ws.pipeline()
            .run_at(now(), &approve("remote_server_archive"))
            .unwrap(),
    );

    assert_eq!(summary.kept_local(), 1);
    assert!(ws.local_folder("2023-01-01").join("ticket_100000.txt").exists());
    assert_eq!(
        std::fs::read(target.join("earlier.txt")).unwrap(),
        b"earlier run"
    );
    assert!(!target.join("ticket_100000.txt").exists());
    assert_in_order(
        &ws.kinds(),
        &[
            AuditEventKind::ArchiveAttempt,
            AuditEventKind::ArchiveFailedExists,
            AuditEventKind::ArchiveFailedKeptLocal,
            AuditEventKind::JobCompleted,
        ],
    );
}

#[test]
fn test_corrupted_copy_fails_and_names_the_file() {
    let ws = TestWorkspace::new();
    two_file_folder(&ws);
    let store = FaultyStore::new(
        &ws.config.archive_dir,
        Fault::CorruptArchived("ticket_100001.txt".to_string()),
    );

    let summary = completed(
        ws.pipeline_with_store(Arc::new(store))
            .run_at(now(), &approve("cloud_archive"))
            .unwrap(),
    );

    assert!(matches!(
        summary.folders[0],
        FolderOutcome::KeptLocal { .. }
    ));
    assert!(ws.local_folder("2023-01-01").join("ticket_100001.txt").exists());

    let failed = ws
        .record(AuditEventKind::ArchiveVerificationFailed)
        .expect("verification failure audited");
    assert_eq!(failed.detail_str("code"), Some("DIGEST_MISMATCH"));
    assert_eq!(failed.detail_str("path"), Some("ticket_100001.txt"));
    assert!(!ws.kinds().contains(&AuditEventKind::LocalDeleted));
}

#[test]
fn test_incomplete_copy_reports_missing_file() {
    let ws = TestWorkspace::new();
    two_file_folder(&ws);
    let store = FaultyStore::new(
        &ws.config.archive_dir,
        Fault::DropArchived("ticket_100000.txt".to_string()),
    );

    completed(
        ws.pipeline_with_store(Arc::new(store))
            .run_at(now(), &approve("cloud_archive"))
            .unwrap(),
    );

    let failed = ws
        .record(AuditEventKind::ArchiveVerificationFailed)
        .unwrap();
    assert_eq!(failed.detail_str("code"), Some("ARCHIVED_FILE_MISSING"));
    assert_eq!(failed.detail_str("path"), Some("ticket_100000.txt"));
    assert!(ws.local_folder("2023-01-01").exists());
}

#[test]
fn test_source_vanishing_mid_run_fails_closed() {
    let ws = TestWorkspace::new();
    two_file_folder(&ws);
    let store = FaultyStore::new(
        &ws.config.archive_dir,
        Fault::DropSource("ticket_100000.txt".to_string()),
    );

    let summary = completed(
        ws.pipeline_with_store(Arc::new(store))
            .run_at(now(), &approve("cloud_archive"))
            .unwrap(),
    );

    assert_eq!(summary.kept_local(), 1);
    let failed = ws
        .record(AuditEventKind::ArchiveVerificationFailed)
        .unwrap();
    assert_eq!(failed.detail_str("code"), Some("SOURCE_MISSING"));
    assert!(ws.local_folder("2023-01-01").join("ticket_100001.txt").exists());
}

#[test]
fn test_destination_escaping_archive_root_is_blocked() {
    let ws = TestWorkspace::new();
    ticket(&ws.config.output_dir, "2023-01-01");

    let summary = completed(ws.pipeline().run_at(now(), &approve("../output")).unwrap());

    assert_eq!(summary.kept_local(), 1);
    assert!(ws.local_folder("2023-01-01").join("ticket_100000.txt").exists());
    let blocked = ws
        .record(AuditEventKind::ArchiveBlockedUnsafePath)
        .unwrap();
    assert_eq!(blocked.detail_str("destination"), Some("../output"));
    assert!(!ws.kinds().contains(&AuditEventKind::LocalDeleted));
}

#[test]
fn test_deletion_guard_refuses_folders_outside_output_root() {
    let ws = TestWorkspace::new();
    // Archive a folder living in a staging area, then hand the verified
    // result to a guard configured for the real output root.
    let staging_config = ws.config.clone().with_output_dir(ws.root().join("staging"));
    let folder_path = ticket(&staging_config.output_dir, "2023-01-01");
    let folder = RetainedFolder::from_path(&folder_path).unwrap();

    let engine = ManifestEngine::new(&staging_config);
    let manifest = engine.build(&folder.path).unwrap();
    engine.write(&folder.path, &manifest).unwrap();

    let transfer = ArchiveTransfer::new(
        &staging_config,
        Arc::new(LocalArchiveStore::new(&staging_config.archive_dir)),
        ws.audit_trail(),
    );
    let verified = transfer
        .transfer(
            &folder,
            &Destination::new("cloud_archive").unwrap(),
            &manifest,
        )
        .into_verified()
        .expect("archive verifies");

    let guard = DeletionGuard::new(&ws.config, ws.audit_trail());
    assert_eq!(
        guard.delete_verified(verified),
        DeletionOutcome::BlockedUnsafePath
    );
    assert!(folder_path.join("ticket_100000.txt").exists());
    assert_eq!(
        ws.kinds().last(),
        Some(&AuditEventKind::LocalDeletionBlockedUnsafePath)
    );
}

#[test]
fn test_retry_after_failed_run_succeeds_once_cleared() {
    let ws = TestWorkspace::new();
    ticket(&ws.config.output_dir, "2023-01-01");
    let stale = ws.archived_folder("remote_server_archive", "2023-01-01");
    std::fs::create_dir_all(&stale).unwrap();

    let first = completed(
        ws.pipeline()
            .run_at(now(), &approve("remote_server_archive"))
            .unwrap(),
    );
    assert_eq!(first.kept_local(), 1);

    // Operator removes the stale target; the next scheduled run picks the
    // folder up again.
    std::fs::remove_dir_all(&stale).unwrap();
    let second = completed(
        ws.pipeline()
            .run_at(now(), &approve("remote_server_archive"))
            .unwrap(),
    );
    assert!(second.is_clean());
    assert!(!ws.local_folder("2023-01-01").exists());
}

#[cfg(unix)]
#[test]
fn test_folder_with_symlink_is_kept_local_untouched() {
    let ws = TestWorkspace::new();
    let secret_dir = ws.root().join("secrets");
    std::fs::create_dir_all(&secret_dir).unwrap();
    std::fs::write(secret_dir.join("key.pem"), b"do not copy").unwrap();

    let folder = ticket(&ws.config.output_dir, "2023-01-01");
    std::os::unix::fs::symlink(secret_dir.join("key.pem"), folder.join("key.pem")).unwrap();
    ticket(&ws.config.output_dir, "2023-01-02");

    let summary = completed(
        ws.pipeline()
            .run_at(now(), &approve("remote_server_archive"))
            .unwrap(),
    );

    assert!(!summary.is_clean());
    assert!(matches!(summary.folders[0], FolderOutcome::KeptLocal { .. }));
    assert!(matches!(summary.folders[1], FolderOutcome::Archived { .. }));

    assert!(std::fs::symlink_metadata(folder.join("key.pem"))
        .unwrap()
        .file_type()
        .is_symlink());
    assert!(folder.join("ticket_100000.txt").exists());
    assert!(!ws
        .archived_folder("remote_server_archive", "2023-01-01")
        .exists());
    assert_eq!(
        std::fs::read(secret_dir.join("key.pem")).unwrap(),
        b"do not copy"
    );

    let blocked = ws
        .record(AuditEventKind::ArchiveBlockedUnsupportedEntries)
        .expect("blocked folder audited");
    assert_eq!(blocked.detail_str("folder"), Some("2023-01-01"));
    assert_eq!(blocked.details["entries"], serde_json::json!(["key.pem"]));
}

#[test]
fn test_source_rewritten_during_copy_fails_closed() {
    let ws = TestWorkspace::new();
    two_file_folder(&ws);
    let store = FaultyStore::new(
        &ws.config.archive_dir,
        Fault::ModifySource("ticket_100000.txt".to_string()),
    );

    let summary = completed(
        ws.pipeline_with_store(Arc::new(store))
            .run_at(now(), &approve("cloud_archive"))
            .unwrap(),
    );

    assert!(matches!(summary.folders[0], FolderOutcome::KeptLocal { .. }));
    let failed = ws
        .record(AuditEventKind::ArchiveVerificationFailed)
        .unwrap();
    assert_eq!(failed.detail_str("code"), Some("SOURCE_CHANGED"));
    assert_eq!(failed.detail_str("path"), Some("ticket_100000.txt"));
    assert_eq!(
        std::fs::read(ws.local_folder("2023-01-01").join("ticket_100000.txt")).unwrap(),
        b"9876543210"
    );
    assert!(!ws.kinds().contains(&AuditEventKind::LocalDeleted));
}

#[test]
fn test_file_added_during_copy_fails_closed() {
    let ws = TestWorkspace::new();
    two_file_folder(&ws);
    let store = FaultyStore::new(
        &ws.config.archive_dir,
        Fault::AddSource("ticket_100002.txt".to_string()),
    );

    let summary = completed(
        ws.pipeline_with_store(Arc::new(store))
            .run_at(now(), &approve("cloud_archive"))
            .unwrap(),
    );

    assert_eq!(summary.kept_local(), 1);
    let failed = ws
        .record(AuditEventKind::ArchiveVerificationFailed)
        .unwrap();
    assert_eq!(failed.detail_str("code"), Some("UNEXPECTED_SOURCE_FILE"));
    assert_eq!(failed.detail_str("path"), Some("ticket_100002.txt"));
    assert!(ws.local_folder("2023-01-01").join("ticket_100002.txt").exists());
}

#[test]
fn test_copy_failure_keeps_folder_and_run_continues() {
    let ws = TestWorkspace::new();
    two_file_folder(&ws);
    ticket(&ws.config.output_dir, "2023-01-02");
    let store = FaultyStore::new(&ws.config.archive_dir, Fault::FailCopy).for_folder("2023-01-01");

    let summary = completed(
        ws.pipeline_with_store(Arc::new(store))
            .run_at(now(), &approve("cloud_archive"))
            .unwrap(),
    );

    match &summary.folders[0] {
        FolderOutcome::KeptLocal { folder, reason } => {
            assert_eq!(folder, "2023-01-01");
            assert!(reason.contains("destination unreachable"));
        }
        other => panic!("expected the folder to be kept, got {:?}", other),
    }
    assert!(matches!(summary.folders[1], FolderOutcome::Archived { .. }));
    assert!(ws.local_folder("2023-01-01").join("ticket_100001.txt").exists());
    assert!(!ws.local_folder("2023-01-02").exists());

    let failed = ws.record(AuditEventKind::ArchiveCopyFailed).unwrap();
    assert_eq!(failed.detail_str("folder"), Some("2023-01-01"));
    assert!(ws.record(AuditEventKind::ArchiveVerified).is_some());
    assert_in_order(
        &ws.kinds(),
        &[
            AuditEventKind::ArchiveCopyFailed,
            AuditEventKind::ArchiveFailedKeptLocal,
            AuditEventKind::ArchiveVerified,
            AuditEventKind::LocalDeleted,
            AuditEventKind::JobCompleted,
        ],
    );
}

#[test]
fn test_manifest_failure_keeps_folder_and_run_continues() {
    let ws = TestWorkspace::new();
    let broken = ticket(&ws.config.output_dir, "2023-01-01");
    // A directory where the manifest file has to be written
    std::fs::create_dir(broken.join("manifest.json")).unwrap();
    ticket(&ws.config.output_dir, "2023-01-02");

    let summary = completed(
        ws.pipeline()
            .run_at(now(), &approve("cloud_archive"))
            .unwrap(),
    );

    assert!(matches!(summary.folders[0], FolderOutcome::KeptLocal { .. }));
    assert!(matches!(summary.folders[1], FolderOutcome::Archived { .. }));
    assert!(broken.join("ticket_100000.txt").exists());
    assert!(!ws.archived_folder("cloud_archive", "2023-01-01").exists());

    let failed = ws.record(AuditEventKind::ManifestFailed).unwrap();
    assert_eq!(failed.detail_str("folder"), Some("2023-01-01"));
    assert_in_order(
        &ws.kinds(),
        &[
            AuditEventKind::ManifestFailed,
            AuditEventKind::ArchiveFailedKeptLocal,
            AuditEventKind::ArchiveVerified,
            AuditEventKind::JobCompleted,
        ],
    );
}

#[test]
fn test_deletion_failure_is_reported_and_run_continues() {
    let ws = TestWorkspace::new();
    ticket(&ws.config.output_dir, "2023-01-01");
    ticket(&ws.config.output_dir, "2023-01-02");

    let summary = completed(
        ws.pipeline()
            .with_retained_store(Arc::new(FailingRemover::new("2023-01-01")))
            .run_at(now(), &approve("remote_server_archive"))
            .unwrap(),
    );

    assert_eq!(summary.deletion_failures(), 1);
    assert!(!summary.is_clean());
    match &summary.folders[0] {
        FolderOutcome::DeletionFailed { folder, reason, .. } => {
            assert_eq!(folder, "2023-01-01");
            assert!(reason.contains("Resource busy"));
        }
        other => panic!("expected a deletion failure, got {:?}", other),
    }
    assert!(matches!(summary.folders[1], FolderOutcome::Archived { .. }));

    // Verified archive plus surviving original
    assert!(ws
        .archived_folder("remote_server_archive", "2023-01-01")
        .join("ticket_100000.txt")
        .exists());
    assert!(ws.local_folder("2023-01-01").join("ticket_100000.txt").exists());
    assert!(!ws.local_folder("2023-01-02").exists());

    let failed = ws.record(AuditEventKind::LocalDeletionFailed).unwrap();
    assert_eq!(failed.detail_str("folder"), Some("2023-01-01"));
    let completed_record = ws.record(AuditEventKind::JobCompleted).unwrap();
    assert_eq!(completed_record.details["deletion_failures"], 1);
}

#[test]
fn test_config_rejects_nested_roots() {
    let ws = TestWorkspace::new();
    let nested: ArchivistConfig = ws
        .config
        .clone()
        .with_archive_dir(ws.config.output_dir.join("archive"));
    assert!(nested.validate().is_err());
}
