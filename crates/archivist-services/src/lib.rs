//! Archivist Services Layer
//!
//! This crate hosts the retention-and-archival pipeline: the manifest engine,
//! the audit trail, the expiration scanner, the archive transfer executor,
//! the deletion guard and the orchestrator that sequences them for every
//! expired folder. Storage primitives live in `archivist-storage`; prompting
//! and argument parsing live in the CLI, behind the `DecisionProvider` trait.

pub mod archive;
pub mod audit;
pub mod cleanup;
pub mod manifest;
pub mod pipeline;
pub mod retention;

pub use archive::{ArchiveTransfer, TransferOutcome, VerifiedArchive};
pub use audit::{AuditSink, AuditTrail, JsonlAuditLog, MemoryAuditLog};
pub use cleanup::{DeletionGuard, DeletionOutcome};
pub use manifest::ManifestEngine;
pub use pipeline::{
    DecisionProvider, FolderOutcome, Pipeline, PresetDecisions, RunOutcome, RunSummary,
};
pub use retention::find_expired;
