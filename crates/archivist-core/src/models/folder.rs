use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::FOLDER_DATE_FORMAT;

/// A date-named directory directly under the retained-data root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RetainedFolder {
    // Field order matters for Ord: date first, then name
    pub date: NaiveDate,
    pub name: String,
    pub path: PathBuf,
}

impl RetainedFolder {
    /// Build a retained folder from a directory path, returning `None` when the
    /// final component is not a strict `YYYY-MM-DD` date.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let date = parse_folder_date(name)?;
        Some(Self {
            date,
            name: name.to_string(),
            path: path.to_path_buf(),
        })
    }

    /// Expired means dated strictly before the cutoff.
    pub fn is_expired(&self, cutoff: NaiveDate) -> bool {
        self.date < cutoff
    }
}

/// Parse a folder name as a zero-padded calendar date.
///
/// `chrono` alone accepts `2023-1-5`; the shape check keeps folder names
/// and dates in one-to-one correspondence so that name order is date order.
pub fn parse_folder_date(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(name, FOLDER_DATE_FORMAT).ok()
}

/// First date that is still retained: `today - retention_days`.
pub fn retention_cutoff(today: NaiveDate, retention_days: u32) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(i64::from(retention_days)))
        .unwrap_or(NaiveDate::MIN)
}
