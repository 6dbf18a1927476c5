mod service;

pub use service::{ArchiveTransfer, TransferOutcome, VerifiedArchive};
