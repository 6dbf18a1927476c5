//! Shared constants.

/// File name of the manifest written at the top level of every archived folder.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Operational log file name (inside the configured log directory).
pub const APP_LOG_FILE_NAME: &str = "archivist.log";

/// Audit trail file name (inside the configured log directory).
pub const AUDIT_LOG_FILE_NAME: &str = "audit.log";

/// Retained folders are named after the day they hold.
pub const FOLDER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format used in manifests and audit records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Destinations offered by the interactive prompt, in menu order.
pub const PRESET_DESTINATIONS: &[&str] = &[
    "remote_server_archive",
    "external_drive_archive",
    "cloud_archive",
];
