//! Configuration module
//!
//! This module provides the run configuration for the retention pipeline:
//! where retained data lives, where archives go, where logs are written, how
//! long data is kept and whether the run is a dry run. The configuration is
//! built once at start-up and handed to every component by reference.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::constants::{APP_LOG_FILE_NAME, AUDIT_LOG_FILE_NAME};

// Defaults
const OUTPUT_DIR: &str = "output";
const ARCHIVE_DIR: &str = "archive";
const LOG_DIR: &str = "logs";
const RETENTION_DAYS: u32 = 60;

/// Run configuration for the retention-and-archival pipeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchivistConfig {
    /// Retained-data root; immediate subdirectories are named `YYYY-MM-DD`
    pub output_dir: PathBuf,
    /// Archive root; archives land in `archive_dir/<destination>/<folder>`
    pub archive_dir: PathBuf,
    /// Directory for the operational log and the audit trail
    pub log_dir: PathBuf,
    /// Folders dated strictly before `today - retention_days` are expired
    pub retention_days: u32,
    /// When set, every decision is made and logged but nothing is written,
    /// copied or deleted
    pub dry_run: bool,
}

impl Default for ArchivistConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(OUTPUT_DIR),
            archive_dir: PathBuf::from(ARCHIVE_DIR),
            log_dir: PathBuf::from(LOG_DIR),
            retention_days: RETENTION_DAYS,
            dry_run: false,
        }
    }
}

impl ArchivistConfig {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        archive_dir: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
        retention_days: u32,
        dry_run: bool,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            archive_dir: archive_dir.into(),
            log_dir: log_dir.into(),
            retention_days,
            dry_run,
        }
    }

    /// Load configuration from the environment (and a `.env` file, if any).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let retention_days = match env::var("ARCHIVIST_RETENTION_DAYS") {
            Ok(raw) => raw.trim().parse::<u32>().map_err(|_| {
                anyhow::anyhow!(
                    "ARCHIVIST_RETENTION_DAYS must be a non-negative whole number of days, got {:?}",
                    raw
                )
            })?,
            Err(_) => RETENTION_DAYS,
        };

        let config = Self {
            output_dir: env::var("ARCHIVIST_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(OUTPUT_DIR)),
            archive_dir: env::var("ARCHIVIST_ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(ARCHIVE_DIR)),
            log_dir: env::var("ARCHIVIST_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(LOG_DIR)),
            retention_days,
            dry_run: env::var("ARCHIVIST_DRY_RUN")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, path) in [
            ("output directory", &self.output_dir),
            ("archive directory", &self.archive_dir),
            ("log directory", &self.log_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("The {} must not be empty", name));
            }
        }

        let output = lexical_normalize(&self.output_dir);
        let archive = lexical_normalize(&self.archive_dir);

        if output == archive {
            return Err(anyhow::anyhow!(
                "Output and archive directories must differ (both are {})",
                self.output_dir.display()
            ));
        }

        if archive.starts_with(&output) || output.starts_with(&archive) {
            return Err(anyhow::anyhow!(
                "Output directory {} and archive directory {} must not be nested",
                self.output_dir.display(),
                self.archive_dir.display()
            ));
        }

        Ok(())
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.log_dir.join(AUDIT_LOG_FILE_NAME)
    }

    pub fn app_log_path(&self) -> PathBuf {
        self.log_dir.join(APP_LOG_FILE_NAME)
    }

    // Builder-style overrides, applied by the CLI on top of the environment
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = dir.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Absolute, `.`/`..`-free form of a path without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
