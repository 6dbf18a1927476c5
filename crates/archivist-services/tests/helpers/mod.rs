//! Test helpers: a throwaway output/archive/log layout and a pipeline wired
//! to an in-memory audit log.
//!
//! Run from workspace root: `cargo test -p archivist-services`.

#![allow(dead_code)]

pub mod fixtures;
pub mod stores;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use archivist_core::{ArchivistConfig, AuditEventKind, AuditRecord};
use archivist_services::{AuditTrail, MemoryAuditLog, Pipeline};
use archivist_storage::{walk_files, ArchiveStore, LocalArchiveStore};
use tempfile::TempDir;

/// Test workspace: temp directory, configuration and captured audit records.
pub struct TestWorkspace {
    pub temp_dir: TempDir,
    pub config: ArchivistConfig,
    pub audit: Arc<MemoryAuditLog>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self::with_dry_run(false)
    }

    pub fn with_dry_run(dry_run: bool) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let config = ArchivistConfig::new(
            temp_dir.path().join("output"),
            temp_dir.path().join("archive"),
            temp_dir.path().join("logs"),
            60,
            dry_run,
        );
        Self {
            temp_dir,
            config,
            audit: Arc::new(MemoryAuditLog::new()),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn audit_trail(&self) -> AuditTrail {
        AuditTrail::new(self.audit.clone())
    }

    /// Pipeline archiving to the local archive root
    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_with_store(Arc::new(LocalArchiveStore::new(&self.config.archive_dir)))
    }

    pub fn pipeline_with_store(&self, store: Arc<dyn ArchiveStore>) -> Pipeline {
        Pipeline::new(&self.config, store, self.audit_trail())
    }

    pub fn local_folder(&self, name: &str) -> PathBuf {
        self.config.output_dir.join(name)
    }

    pub fn archived_folder(&self, destination: &str, name: &str) -> PathBuf {
        self.config.archive_dir.join(destination).join(name)
    }

    pub fn kinds(&self) -> Vec<AuditEventKind> {
        self.audit.kinds()
    }

    /// First audit record of the given kind
    pub fn record(&self, kind: AuditEventKind) -> Option<AuditRecord> {
        self.audit.records().into_iter().find(|r| r.event == kind)
    }

    /// Every regular file under the workspace with its contents, for
    /// before/after comparisons.
    pub fn snapshot(&self) -> Vec<(String, Vec<u8>)> {
        walk_files(self.root(), None)
            .expect("Failed to walk workspace")
            .files
            .into_iter()
            .map(|file| {
                let contents = std::fs::read(&file.path).expect("Failed to read file");
                (file.relative, contents)
            })
            .collect()
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert that `expected` occurs in `actual` in order (not necessarily
/// adjacent).
pub fn assert_in_order(actual: &[AuditEventKind], expected: &[AuditEventKind]) {
    let mut remaining = actual.iter();
    for kind in expected {
        assert!(
            remaining.any(|k| k == kind),
            "expected {:?} in order within {:?}",
            expected,
            actual
        );
    }
}
