//! Test fixtures: dated folders and a fixed clock.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

/// 2023-06-01 12:00:00; with 60 days of retention the cutoff is 2023-04-02.
pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 6, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid fixture date")
}

/// Create `root/name` with the given files (paths relative, `/`-separated).
pub fn seed_folder(root: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let folder = root.join(name);
    fs::create_dir_all(&folder).expect("Failed to create folder");
    for (relative, contents) in files {
        let path = relative
            .split('/')
            .fold(folder.clone(), |acc, part| acc.join(part));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent");
        }
        fs::write(&path, contents).expect("Failed to write fixture file");
    }
    folder
}

/// One intake record, as the intake tool writes them
pub fn ticket(root: &Path, name: &str) -> PathBuf {
    seed_folder(root, name, &[("ticket_100000.txt", &b"0123456789"[..])])
}
