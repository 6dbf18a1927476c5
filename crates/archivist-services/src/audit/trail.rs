use std::sync::Arc;

use archivist_core::error::ErrorMetadata;
use archivist_core::{AuditEvent, AuditRecord};

use super::sink::{AuditSink, JsonlAuditLog};

/// Records pipeline decisions without ever failing the caller
///
/// A failed write is reported on the operational log and otherwise ignored,
/// so the outcome of the operation being audited is never masked.
#[derive(Clone)]
pub struct AuditTrail {
    sink: Arc<dyn AuditSink>,
}

impl AuditTrail {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Audit trail backed by a JSON Lines file
    pub fn jsonl(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Arc::new(JsonlAuditLog::new(path)))
    }

    pub fn record(&self, event: AuditEvent) {
        let written = AuditRecord::now(&event).and_then(|record| self.sink.append(&record));
        if let Err(e) = written {
            tracing::error!(
                error = %e,
                error_code = e.error_code(),
                event = ?event,
                "Failed to write audit record"
            );
        }
    }
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail").finish_non_exhaustive()
    }
}
