use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use archivist_core::{retention_cutoff, ArchivistResult, RetainedFolder};
use chrono::NaiveDate;

/// Select the immediate subdirectories of `output_root` whose date name is
/// strictly earlier than `today - retention_days`, oldest first.
///
/// A missing root yields an empty list; a root that cannot be listed is an
/// error. Entries that are not directories, symlinks, names that are not
/// `YYYY-MM-DD` dates and entries that cannot be inspected are skipped.
#[tracing::instrument(skip_all, fields(output_root = %output_root.display(), retention_days))]
pub fn find_expired(
    output_root: &Path,
    retention_days: u32,
    today: NaiveDate,
) -> ArchivistResult<Vec<RetainedFolder>> {
    let entries = match fs::read_dir(output_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("Retained-data root does not exist, nothing to scan");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let cutoff = retention_cutoff(today, retention_days);
    let mut expired = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry in retained-data root");
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping entry of unknown type");
                continue;
            }
        };

        if file_type.is_symlink() {
            tracing::warn!(path = %path.display(), "Skipping symlink in retained-data root");
            continue;
        }
        if !file_type.is_dir() {
            continue;
        }

        let Some(folder) = RetainedFolder::from_path(&path) else {
            tracing::info!(path = %path.display(), "Skipping non-date folder");
            continue;
        };

        if folder.is_expired(cutoff) {
            tracing::debug!(folder = %folder.name, "Folder expired");
            expired.push(folder);
        }
    }

    expired.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::info!(
        cutoff = %cutoff,
        expired = expired.len(),
        "Expiration scan finished"
    );

    Ok(expired)
}
