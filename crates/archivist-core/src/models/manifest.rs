use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::TIMESTAMP_FORMAT;

/// One regular file inside a retained folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Folder-relative, `/`-separated
    pub path: String,
    pub size_bytes: u64,
    /// Lowercase hex SHA-256
    pub sha256: String,
}

/// Ordered fingerprint of a folder's files at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub folder: String,
    pub created_at: String,
    pub files: Vec<FileEntry>,
    /// Symlinks and special files that were deliberately not enumerated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl Manifest {
    /// Entries and skipped paths are sorted so that two manifests of the same
    /// tree compare equal regardless of directory iteration order.
    pub fn new(
        folder: impl Into<String>,
        created_at: NaiveDateTime,
        mut files: Vec<FileEntry>,
        mut skipped: Vec<String>,
    ) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        skipped.sort();
        Self {
            folder: folder.into(),
            created_at: created_at.format(TIMESTAMP_FORMAT).to_string(),
            files,
            skipped,
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn entry(&self, path: &str) -> Option<&FileEntry> {
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.files[idx])
    }

    /// Describe the first field on which two manifests differ, or `None` if
    /// they are equal.
    pub fn first_difference(&self, other: &Manifest) -> Option<String> {
        if self.folder != other.folder {
            return Some(format!(
                "folder differs: {} vs {}",
                self.folder, other.folder
            ));
        }
        if self.created_at != other.created_at {
            return Some(format!(
                "created_at differs: {} vs {}",
                self.created_at, other.created_at
            ));
        }
        if self.files.len() != other.files.len() {
            return Some(format!(
                "file count differs: {} vs {}",
                self.files.len(),
                other.files.len()
            ));
        }
        if let Some((ours, theirs)) = self
            .files
            .iter()
            .zip(other.files.iter())
            .find(|(a, b)| a != b)
        {
            return Some(format!(
                "entry differs: {} vs {}",
                ours.path, theirs.path
            ));
        }
        if self.skipped != other.skipped {
            return Some("skipped entries differ".to_string());
        }
        None
    }
}
