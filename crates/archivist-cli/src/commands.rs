//! Read-only inspection commands: nothing here writes, copies or deletes.

use std::path::PathBuf;

use anyhow::Context;
use archivist_core::error::ErrorMetadata;
use archivist_core::{ArchivistConfig, Destination, Manifest, RetainedFolder};
use archivist_services::{find_expired, ManifestEngine};
use archivist_storage::{is_safe_subpath, ArchiveStore, LocalArchiveStore};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub output_dir: PathBuf,
    pub retention_days: u32,
    pub today: NaiveDate,
    pub expired: Vec<RetainedFolder>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyReport {
    Verified {
        archive_target: PathBuf,
        folder: String,
        file_count: usize,
        total_bytes: u64,
    },
    Failed {
        archive_target: PathBuf,
        code: String,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
}

impl VerifyReport {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerifyReport::Verified { .. })
    }
}

pub fn scan(config: &ArchivistConfig, today: NaiveDate) -> anyhow::Result<ScanReport> {
    let expired = find_expired(&config.output_dir, config.retention_days, today)
        .with_context(|| format!("Failed to scan {}", config.output_dir.display()))?;

    Ok(ScanReport {
        output_dir: config.output_dir.clone(),
        retention_days: config.retention_days,
        today,
        expired,
    })
}

/// Build (but do not write) the manifest for a retained folder
pub fn manifest(config: &ArchivistConfig, folder: &str) -> anyhow::Result<Manifest> {
    let path = config.output_dir.join(folder);
    if !is_safe_subpath(&config.output_dir, &path) {
        anyhow::bail!(
            "{} is not a folder inside {}",
            folder,
            config.output_dir.display()
        );
    }
    if !path.is_dir() {
        anyhow::bail!("Folder not found: {}", path.display());
    }

    ManifestEngine::new(config)
        .build(&path)
        .with_context(|| format!("Failed to build manifest for {}", path.display()))
}

/// Re-verify an existing archive against the manifest stored inside it
pub fn verify(
    config: &ArchivistConfig,
    folder: &str,
    destination: &Destination,
) -> anyhow::Result<VerifyReport> {
    let store = LocalArchiveStore::new(&config.archive_dir);
    let archive_target = store
        .target_path(destination.as_str(), folder)
        .context("Refusing to inspect an archive outside the archive root")?;

    if !archive_target.is_dir() {
        anyhow::bail!("Archive not found: {}", archive_target.display());
    }

    let report = match ManifestEngine::new(config).verify_archived(&archive_target) {
        Ok(manifest) => VerifyReport::Verified {
            archive_target,
            folder: manifest.folder.clone(),
            file_count: manifest.file_count(),
            total_bytes: manifest.total_bytes(),
        },
        Err(failure) => VerifyReport::Failed {
            archive_target,
            code: failure.error_code().to_string(),
            reason: failure.to_string(),
            path: failure.path().map(str::to_string),
        },
    };

    Ok(report)
}
