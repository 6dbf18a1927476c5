use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use archivist_core::constants::MANIFEST_FILE_NAME;
use archivist_core::{
    ArchivistConfig, ArchivistError, ArchivistResult, FileEntry, Manifest, VerificationFailure,
};
use archivist_storage::fs_tree::join_posix;
use archivist_storage::{digest_of, walk_files, StorageError};
use chrono::NaiveDateTime;

/// Builds, persists and verifies folder manifests
#[derive(Clone, Debug)]
pub struct ManifestEngine {
    dry_run: bool,
}

impl ManifestEngine {
    pub fn new(config: &ArchivistConfig) -> Self {
        Self {
            dry_run: config.dry_run,
        }
    }

    /// Snapshot every regular file under `folder`, stamped with the current
    /// local time.
    pub fn build(&self, folder: &Path) -> ArchivistResult<Manifest> {
        self.build_at(folder, chrono::Local::now().naive_local())
    }

    pub fn build_at(&self, folder: &Path, created_at: NaiveDateTime) -> ArchivistResult<Manifest> {
        let folder_name = folder
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| manifest_error(folder, "folder has no usable name"))?;

        let listing = walk_files(folder, Some(MANIFEST_FILE_NAME))
            .map_err(|e| manifest_error(folder, e))?;

        let mut files = Vec::with_capacity(listing.files.len());
        for file in &listing.files {
            let digest = digest_of(&file.path).map_err(|e| manifest_error(folder, e))?;
            files.push(FileEntry {
                path: file.relative.clone(),
                size_bytes: digest.size_bytes,
                sha256: digest.sha256,
            });
        }

        let manifest = Manifest::new(folder_name, created_at, files, listing.skipped);

        tracing::debug!(
            folder = %folder_name,
            files = manifest.file_count(),
            bytes = manifest.total_bytes(),
            skipped = manifest.skipped.len(),
            "Manifest built"
        );

        Ok(manifest)
    }

    /// Persist the manifest at the top level of `folder` so that a recursive
    /// copy carries it along. A no-op under dry run.
    pub fn write(&self, folder: &Path, manifest: &Manifest) -> ArchivistResult<()> {
        let path = folder.join(MANIFEST_FILE_NAME);

        if self.dry_run {
            tracing::info!(path = %path.display(), "[DRY RUN] Would write manifest");
            return Ok(());
        }

        let json = serde_json::to_string_pretty(manifest)?;
        fs::write(&path, json).map_err(|e| manifest_error(folder, e))?;

        tracing::info!(path = %path.display(), files = manifest.file_count(), "Manifest written");
        Ok(())
    }

    /// Parse the manifest persisted inside `folder`
    pub fn read(&self, folder: &Path) -> ArchivistResult<Manifest> {
        let path = folder.join(MANIFEST_FILE_NAME);
        let raw = fs::read_to_string(&path).map_err(|e| manifest_error(folder, e))?;
        serde_json::from_str(&raw).map_err(|e| manifest_error(folder, e))
    }

    /// Verify an archived copy against the manifest built from its source.
    ///
    /// Stops at the first failing check. Every entry must still match the
    /// source and the archive in size and digest, the source must hold no
    /// file or entry the manifest does not list, and the archived manifest
    /// must equal `manifest`.
    pub fn verify(
        &self,
        source: &Path,
        archived: &Path,
        manifest: &Manifest,
    ) -> Result<(), VerificationFailure> {
        let result = self.check_copy(source, archived, manifest);

        match &result {
            Ok(()) => tracing::info!(
                archived = %archived.display(),
                files = manifest.file_count(),
                "Archive verification passed"
            ),
            Err(failure) => tracing::warn!(
                archived = %archived.display(),
                reason = %failure,
                path = failure.path().unwrap_or_default(),
                "Archive verification failed"
            ),
        }

        result
    }

    /// Verify an archive against the manifest stored inside it, with no
    /// source side. Returns the archived manifest on success.
    pub fn verify_archived(&self, archived: &Path) -> Result<Manifest, VerificationFailure> {
        let manifest = read_archived_manifest(archived)?;
        for entry in &manifest.files {
            check_archived_entry(archived, entry)?;
        }

        tracing::info!(
            archived = %archived.display(),
            files = manifest.file_count(),
            "Stored archive verified"
        );
        Ok(manifest)
    }

    fn check_copy(
        &self,
        source: &Path,
        archived: &Path,
        manifest: &Manifest,
    ) -> Result<(), VerificationFailure> {
        for entry in &manifest.files {
            check_source_entry(source, entry)?;
            check_archived_entry(archived, entry)?;
        }

        // Anything the producer added since the manifest was built has no copy
        let listing = walk_files(source, Some(MANIFEST_FILE_NAME)).map_err(|e| {
            VerificationFailure::Unreadable {
                path: ".".to_string(),
                reason: e.to_string(),
            }
        })?;
        if let Some(file) = listing
            .files
            .iter()
            .find(|file| manifest.entry(&file.relative).is_none())
        {
            return Err(VerificationFailure::UnexpectedSourceFile {
                path: file.relative.clone(),
            });
        }
        if let Some(path) = listing.skipped.into_iter().next() {
            return Err(VerificationFailure::UnsupportedSourceEntry { path });
        }

        let stored = read_archived_manifest(archived)?;
        if let Some(difference) = stored.first_difference(manifest) {
            return Err(VerificationFailure::ArchivedManifestMismatch { reason: difference });
        }

        Ok(())
    }
}

fn manifest_error(folder: &Path, err: impl std::fmt::Display) -> ArchivistError {
    ArchivistError::Manifest {
        path: folder.to_path_buf(),
        message: err.to_string(),
    }
}

/// The source file must still hold exactly the bytes the manifest recorded
fn check_source_entry(source: &Path, entry: &FileEntry) -> Result<(), VerificationFailure> {
    let digest = digest_of(&join_posix(source, &entry.path)).map_err(|e| match e {
        StorageError::NotFound(_) => VerificationFailure::SourceMissing {
            path: entry.path.clone(),
        },
        other => VerificationFailure::Unreadable {
            path: entry.path.clone(),
            reason: other.to_string(),
        },
    })?;

    if digest.size_bytes != entry.size_bytes {
        return Err(VerificationFailure::SourceChanged {
            path: entry.path.clone(),
            reason: format!(
                "size {} bytes, manifest recorded {}",
                digest.size_bytes, entry.size_bytes
            ),
        });
    }
    if digest.sha256 != entry.sha256 {
        return Err(VerificationFailure::SourceChanged {
            path: entry.path.clone(),
            reason: "content hash differs from manifest".to_string(),
        });
    }

    Ok(())
}

fn check_archived_entry(archived: &Path, entry: &FileEntry) -> Result<(), VerificationFailure> {
    let archived_file = join_posix(archived, &entry.path);

    let metadata = match fs::metadata(&archived_file) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(VerificationFailure::ArchivedMissing {
                path: entry.path.clone(),
            })
        }
        Err(e) => {
            return Err(VerificationFailure::Unreadable {
                path: entry.path.clone(),
                reason: e.to_string(),
            })
        }
    };

    if metadata.len() != entry.size_bytes {
        return Err(VerificationFailure::SizeMismatch {
            path: entry.path.clone(),
            expected: entry.size_bytes,
            actual: metadata.len(),
        });
    }

    let digest = digest_of(&archived_file).map_err(|e| match e {
        StorageError::NotFound(_) => VerificationFailure::ArchivedMissing {
            path: entry.path.clone(),
        },
        other => VerificationFailure::Unreadable {
            path: entry.path.clone(),
            reason: other.to_string(),
        },
    })?;

    if digest.sha256 != entry.sha256 {
        return Err(VerificationFailure::DigestMismatch {
            path: entry.path.clone(),
            expected: entry.sha256.clone(),
            actual: digest.sha256,
        });
    }

    Ok(())
}

fn read_archived_manifest(archived: &Path) -> Result<Manifest, VerificationFailure> {
    let raw = match fs::read_to_string(archived.join(MANIFEST_FILE_NAME)) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(VerificationFailure::ArchivedManifestMissing)
        }
        Err(e) => {
            return Err(VerificationFailure::Unreadable {
                path: MANIFEST_FILE_NAME.to_string(),
                reason: e.to_string(),
            })
        }
    };

    serde_json::from_str(&raw).map_err(|e| VerificationFailure::ArchivedManifestMismatch {
        reason: format!("unparsable manifest: {}", e),
    })
}
