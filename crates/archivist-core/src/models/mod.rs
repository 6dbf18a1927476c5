//! Data models for the retention pipeline
//!
//! Each sub-module covers one piece of the on-disk or in-memory contract:
//! retained folders, manifests and audit records.

mod audit;
mod folder;
mod manifest;

pub use audit::*;
pub use folder::*;
pub use manifest::*;
