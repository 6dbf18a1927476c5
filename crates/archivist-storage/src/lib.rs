//! Archivist Storage Library
//!
//! Filesystem primitives used by the retention pipeline: the path guard that
//! confines every read, write and delete to an expected root, the streaming
//! content hasher, the tree walk/copy/remove utilities with an explicit
//! symlink policy, and the `ArchiveStore` and `RetainedStore` abstractions over
//! where archives go and how retained folders are removed.
//!
//! # Symlinks and special files
//!
//! Tree walks never follow symbolic links. Regular files are enumerated;
//! symlinks (to files or directories), sockets, FIFOs and device nodes are
//! reported as skipped. Copies recreate directories and regular files only.

pub mod fs_tree;
pub mod hasher;
pub mod local;
pub mod path_guard;
pub mod traits;

// Re-export commonly used types
pub use fs_tree::{copy_tree, remove_tree, walk_files, CopyReport, TreeFile, TreeListing};
pub use hasher::{digest_of, FileDigest};
pub use local::{LocalArchiveStore, LocalRetainedStore};
pub use path_guard::{is_safe_subpath, resolve_lenient};
pub use traits::{ArchiveStore, RetainedStore, StorageError, StorageResult};
