//! Recursive folder walk that mirrors every sync folder to disk.

use std::io;
use std::path::{Path, PathBuf};

use super::download::download_file;
use super::types::MirrorStats;
use crate::error::{AppError, Result};
use crate::sugarsync::{FileEntry, SugarSyncClient, PAGE_SIZE};

/// Mirrors an account's sync folders into a local directory.
#[derive(Debug, Clone)]
pub struct Mirror {
    client: SugarSyncClient,
    replace: bool,
}

impl Mirror {
    /// `replace` controls whether files already present locally are downloaded again.
    pub fn new(client: SugarSyncClient, replace: bool) -> Self {
        Self { client, replace }
    }

    /// Run the whole mirror and reduce the outcome to success or failure.
    pub async fn download_all(&self, output: &Path) -> bool {
        match self.run(output).await {
            Ok(stats) => {
                tracing::info!("Mirror complete: {}", stats);
                true
            }
            Err(e) => {
                tracing::error!("Error in download_all: {}", e);
                false
            }
        }
    }

    /// Authenticate, enumerate sync folders and walk each one.
    ///
    /// Only errors that escape the per-file and per-subfolder boundaries are
    /// returned: authentication failures, session sequencing errors, and
    /// failures listing a sync folder root.
    pub async fn run(&self, output: &Path) -> Result<MirrorStats> {
        tracing::info!("Authenticating..");
        self.client.authenticate().await?;

        let profile = self.client.get_user_info().await?;
        let folders = self.client.list_sync_folders(&profile.sync_folders_uri).await?;

        let mut stats = MirrorStats::default();
        for folder in &folders {
            tracing::info!("== SYNC FOLDER DOWNLOAD: {} ==", folder.display_name);

            let local_path = match local_child(output, &folder.display_name) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("Skipping sync folder: {}", e);
                    stats.failed_folders += 1;
                    continue;
                }
            };

            self.walk_folder(&folder.contents_uri, &local_path, 0, &mut stats)
                .await?;
        }

        Ok(stats)
    }

    /// Mirror one folder listing page at `start`, its continuation pages, and
    /// then its subfolders, depth first.
    pub async fn walk_folder(
        &self,
        contents_uri: &str,
        local_path: &Path,
        start: usize,
        stats: &mut MirrorStats,
    ) -> Result<()> {
        ensure_dir(local_path).await?;

        let page = self.client.list_folder_page(contents_uri, start).await?;
        if start == 0 {
            stats.folders += 1;
        }

        for entry in &page.files {
            match self.sync_file(entry, local_path, stats).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Error downloading {}: {}",
                        local_path.join(&entry.display_name).display(),
                        e
                    );
                    stats.failed_files += 1;
                }
            }
        }

        // A full page means the server holds more items at the next offset.
        if page.has_next_page() {
            Box::pin(self.walk_folder(contents_uri, local_path, start + PAGE_SIZE, stats))
                .await?;
        }

        for subfolder in &page.subfolders {
            let result = match local_child(local_path, &subfolder.display_name) {
                Ok(sub_path) => {
                    Box::pin(self.walk_folder(&subfolder.contents_uri, &sub_path, 0, stats)).await
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Error downloading subfolder {}: {}",
                        local_path.join(&subfolder.display_name).display(),
                        e
                    );
                    stats.failed_folders += 1;
                }
            }
        }

        Ok(())
    }

    /// Apply the skip/replace policy to one file, then download it.
    async fn sync_file(
        &self,
        entry: &FileEntry,
        dir: &Path,
        stats: &mut MirrorStats,
    ) -> Result<()> {
        let path = local_child(dir, &entry.display_name)?;

        if !self.replace && tokio::fs::try_exists(&path).await? {
            tracing::info!("File already exists, skipping {}", path.display());
            stats.skipped_existing += 1;
            return Ok(());
        }

        tracing::info!("Downloading: {}", path.display());
        let outcome = download_file(&self.client, entry, &path).await?;
        stats.record(outcome);

        Ok(())
    }
}

/// Create the directory (and parents) if missing.
///
/// A non-directory already occupying the path is an error.
async fn ensure_dir(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(AppError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", path.display()),
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!("Creating folder: {}", path.display());
            tokio::fs::create_dir_all(path).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Join a remote display name onto a local directory.
///
/// Names that would escape the directory are rejected.
pub fn local_child(dir: &Path, display_name: &str) -> Result<PathBuf> {
    let unsafe_name = display_name.is_empty()
        || display_name == "."
        || display_name == ".."
        || display_name.contains(&['/', '\\', '\0'][..]);

    if unsafe_name {
        return Err(AppError::InvalidName(display_name.to_string()));
    }

    Ok(dir.join(display_name))
}
