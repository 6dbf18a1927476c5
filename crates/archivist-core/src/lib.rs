//! Archivist Core Library
//!
//! This crate provides the domain models, error types and configuration shared
//! by every Archivist component: the retained-folder and manifest models, the
//! audit record contract, and the run configuration that is built once at
//! start-up and passed down explicitly.

pub mod config;
pub mod constants;
pub mod destination;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::ArchivistConfig;
pub use destination::Destination;
pub use error::{ArchivistError, ArchivistResult, ErrorMetadata, LogLevel, VerificationFailure};
pub use models::{
    parse_folder_date, retention_cutoff, AuditEvent, AuditEventKind, AuditRecord, FileEntry,
    Manifest, RetainedFolder,
};
