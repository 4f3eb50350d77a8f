//! Outcomes and counters of a mirror run.

use std::fmt;

/// What happened to a single file handed to the downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Content was fetched and written to disk.
    Written { bytes: u64 },
    /// The server only holds metadata for this file.
    NotOnServer,
}

/// Counters accumulated over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub folders: usize,
    pub downloaded: usize,
    pub bytes_written: u64,
    pub skipped_existing: usize,
    pub skipped_not_on_server: usize,
    pub failed_files: usize,
    pub failed_folders: usize,
}

impl MirrorStats {
    pub(crate) fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Written { bytes } => {
                self.downloaded += 1;
                self.bytes_written += bytes;
            }
            DownloadOutcome::NotOnServer => self.skipped_not_on_server += 1,
        }
    }
}

impl fmt::Display for MirrorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folders, {} files downloaded ({} bytes), {} already present, {} not on server, {} files failed, {} folders failed",
            self.folders,
            self.downloaded,
            self.bytes_written,
            self.skipped_existing,
            self.skipped_not_on_server,
            self.failed_files,
            self.failed_folders
        )
    }
}
