mod sink;
mod trail;

pub use sink::{AuditSink, JsonlAuditLog, MemoryAuditLog};
pub use trail::AuditTrail;
