//! Shared pieces of the `archivist` binary: configuration overrides, tracing
//! setup, the read-only inspection commands and the interactive prompt.

pub mod commands;
pub mod prompt;

use std::path::{Path, PathBuf};

use anyhow::Context;
use archivist_core::constants::APP_LOG_FILE_NAME;
use archivist_core::ArchivistConfig;
use clap::Args;
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "archivist=info";

/// Flags that override the `ARCHIVIST_*` environment
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Retained-data root (ARCHIVIST_OUTPUT_DIR)
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
    /// Archive root (ARCHIVIST_ARCHIVE_DIR)
    #[arg(long, global = true)]
    pub archive_dir: Option<PathBuf>,
    /// Directory for archivist.log and audit.log (ARCHIVIST_LOG_DIR)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
    /// Retention window in days (ARCHIVIST_RETENTION_DAYS)
    #[arg(long, global = true)]
    pub retention_days: Option<u32>,
    /// Decide and log everything, change nothing (ARCHIVIST_DRY_RUN)
    #[arg(long, global = true, overrides_with = "no_dry_run")]
    pub dry_run: bool,
    /// Act for real even if ARCHIVIST_DRY_RUN is set
    #[arg(long, global = true, overrides_with = "dry_run")]
    pub no_dry_run: bool,
}

impl ConfigArgs {
    /// Apply the flags on top of `base` and validate the result
    pub fn apply(&self, base: ArchivistConfig) -> anyhow::Result<ArchivistConfig> {
        let mut config = base;
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }
        if let Some(dir) = &self.archive_dir {
            config = config.with_archive_dir(dir);
        }
        if let Some(dir) = &self.log_dir {
            config = config.with_log_dir(dir);
        }
        if let Some(days) = self.retention_days {
            config = config.with_retention_days(days);
        }
        if self.dry_run {
            config = config.with_dry_run(true);
        } else if self.no_dry_run {
            config = config.with_dry_run(false);
        }
        config.validate()?;
        Ok(config)
    }

    /// Environment first, then flags
    pub fn load(&self) -> anyhow::Result<ArchivistConfig> {
        let base = ArchivistConfig::from_env().context("Failed to load configuration")?;
        self.apply(base)
    }
}

/// Initialize tracing for the CLI.
///
/// Human-readable output goes to stderr (JSON when `ARCHIVIST_LOG_FORMAT=json`);
/// with a log directory, a plain-text copy is appended to
/// `<log_dir>/archivist.log`. The returned guard must be held until exit so
/// buffered lines are flushed.
pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("ARCHIVIST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let (file_layer, guard) = match log_dir.map(|dir| (dir, std::fs::create_dir_all(dir))) {
        Some((dir, Ok(()))) => {
            let appender = tracing_appender::rolling::never(dir, APP_LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Some((dir, Err(e))) => {
            eprintln!(
                "warning: cannot create log directory {}: {}; logging to stderr only",
                dir.display(),
                e
            );
            (None, None)
        }
        None => (None, None),
    };

    let (stderr_text, stderr_json) = if json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_text)
        .with(stderr_json)
        .init();

    guard
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}
