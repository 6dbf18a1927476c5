//! Streaming SHA-256 content hashing

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::traits::{StorageError, StorageResult};

const CHUNK_SIZE: usize = 1024 * 1024;

/// Digest and byte count of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    /// Lowercase hex
    pub sha256: String,
    pub size_bytes: u64,
}

/// Hash a file in fixed-size chunks.
///
/// A file that does not exist yields `NotFound`; any other open or read
/// error (including the file vanishing mid-read) yields `ReadFailed`.
pub fn digest_of(path: &Path) -> StorageResult<FileDigest> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound(path.to_path_buf()),
        _ => StorageError::ReadFailed(format!("Failed to open {}: {}", path.display(), e)),
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut size_bytes = 0u64;

    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        hasher.update(&buffer[..read]);
        size_bytes += read as u64;
    }

    Ok(FileDigest {
        sha256: hex::encode(hasher.finalize()),
        size_bytes,
    })
}
