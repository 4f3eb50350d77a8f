//! Single-file download with modification time restore.

use chrono::{DateTime, NaiveDateTime, Utc};
use filetime::FileTime;
use std::path::Path;

use super::types::DownloadOutcome;
use crate::error::{AppError, Result};
use crate::sugarsync::{FileEntry, SugarSyncClient};

/// Download one remote file to `local_path`, replacing any existing content.
///
/// Skip/replace policy is decided by the caller. Errors are returned, never
/// swallowed.
pub async fn download_file(
    client: &SugarSyncClient,
    entry: &FileEntry,
    local_path: &Path,
) -> Result<DownloadOutcome> {
    client.token_manager().ensure_fresh().await?;

    if !entry.present_on_server {
        tracing::info!(
            "Skipping file that isn't present on the server: {}",
            local_path.display()
        );
        return Ok(DownloadOutcome::NotOnServer);
    }

    if entry.file_data_uri.is_empty() {
        return Err(AppError::Internal(format!(
            "No file data URI for {}",
            entry.display_name
        )));
    }

    // Nothing is written unless the remote time can be restored.
    let modified = parse_last_modified(&entry.last_modified)?;

    let data = client.fetch_file_data(&entry.file_data_uri).await?;
    tokio::fs::write(local_path, &data).await?;

    let time = FileTime::from_unix_time(modified.timestamp(), modified.timestamp_subsec_nanos());
    filetime::set_file_times(local_path, time, time)?;

    tracing::debug!(
        "Wrote {} bytes to {} (listed size {:?}, modified {})",
        data.len(),
        local_path.display(),
        entry.size,
        modified
    );

    Ok(DownloadOutcome::Written {
        bytes: data.len() as u64,
    })
}

/// Parse a `lastModified` value. Values without an offset are taken as UTC.
pub fn parse_last_modified(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .map_err(|source| AppError::Timestamp {
            value: value.to_string(),
            source,
        })
}
