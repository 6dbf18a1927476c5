use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use archivist_core::{ArchivistError, ArchivistResult, AuditEventKind, AuditRecord};

/// Append-only destination for audit records
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> ArchivistResult<()>;
}

/// JSON Lines audit log on disk
///
/// The file is opened in append mode for every record and never rewritten.
#[derive(Clone, Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back, in write order. A missing log is empty.
    pub fn records(&self) -> ArchivistResult<Vec<AuditRecord>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, record: &AuditRecord) -> ArchivistResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ArchivistError::Audit(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ArchivistError::Audit(format!("Failed to open {}: {}", self.path.display(), e))
            })?;

        file.write_all(line.as_bytes()).map_err(|e| {
            ArchivistError::Audit(format!("Failed to append to {}: {}", self.path.display(), e))
        })
    }
}

/// In-memory audit sink for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn kinds(&self) -> Vec<AuditEventKind> {
        self.records().iter().map(|record| record.event).collect()
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> ArchivistResult<()> {
        self.records
            .lock()
            .map_err(|_| ArchivistError::Audit("in-memory audit log poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}
