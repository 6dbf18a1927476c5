mod service;

pub use service::{DeletionGuard, DeletionOutcome};
