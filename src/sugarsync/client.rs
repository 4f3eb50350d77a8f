//! SugarSync API client for account and folder operations.

use bytes::Bytes;
use reqwest::{Method, Response};
use std::time::Duration;

use super::auth::{is_error_status, AccessGrant, Credentials, TokenManager, BASE_URL};
use super::types::*;
use crate::error::{AppError, Result};

/// Transport settings shared by every request.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Whole-request timeout for authentication and listing calls
    pub timeout: Duration,
    /// Whole-request timeout for file data fetches, including the body transfer
    pub download_timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(300),
            download_timeout: Duration::from_secs(3600),
            accept_invalid_certs: false,
        }
    }
}

/// Client for interacting with the SugarSync API.
#[derive(Clone, Debug)]
pub struct SugarSyncClient {
    token_manager: TokenManager,
    download_timeout: Duration,
}

impl SugarSyncClient {
    /// Create a new SugarSync client.
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let token_manager = TokenManager::new(credentials, &config)?;
        Ok(Self::with_token_manager(token_manager).with_download_timeout(config.download_timeout))
    }

    /// Create a client around an already configured token manager.
    pub fn with_token_manager(token_manager: TokenManager) -> Self {
        Self {
            token_manager,
            download_timeout: ClientConfig::default().download_timeout,
        }
    }

    /// Override the timeout applied to file data fetches.
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }

    /// Acquire the refresh token and the first access token.
    pub async fn authenticate(&self) -> Result<AccessGrant> {
        self.token_manager.authenticate().await
    }

    /// Make an authenticated GET request. Error statuses become `AppError::Transfer`.
    /// `timeout` overrides the client-wide request timeout.
    async fn get(
        &self,
        url: &str,
        query: &[(&str, usize)],
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let mut request = self.token_manager.authorized(Method::GET, url)?;
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if is_error_status(status) {
            return Err(AppError::Transfer {
                status,
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// GET and decode an XML resource.
    async fn get_xml<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, usize)],
    ) -> Result<T> {
        let text = self.get(url, query, None).await?.text().await?;
        from_xml(&text)
    }

    // ========================================================================
    // Account
    // ========================================================================

    /// Fetch the profile of the authenticated user.
    pub async fn get_user_info(&self) -> Result<UserProfile> {
        let user_id = self.token_manager.user_id()?;
        let url = self.token_manager.endpoint(&format!("user/{}", user_id));

        let data: UserData = self.get_xml(&url, &[]).await?;
        let profile = UserProfile::from_data(user_id, data);

        tracing::info!("Username: {}", profile.username);
        tracing::info!("Nickname: {}", profile.nickname);
        tracing::info!(
            "Usage: {} MB / {} MB",
            profile.usage_mb(),
            profile.limit_mb()
        );

        Ok(profile)
    }

    /// List the top-level sync folders in server order.
    pub async fn list_sync_folders(&self, sync_folders_uri: &str) -> Result<Vec<SyncFolder>> {
        let url = self.token_manager.endpoint(sync_folders_uri);
        let list: SyncFolderList = self.get_xml(&url, &[]).await?;

        for folder in &list.folders {
            tracing::info!("Sync folder: {}", folder.display_name);
        }

        Ok(list.folders)
    }

    // ========================================================================
    // Folder Operations
    // ========================================================================

    /// Fetch one page of a folder listing starting at `start`.
    /// The page size is fixed by the server.
    pub async fn list_folder_page(&self, contents_uri: &str, start: usize) -> Result<FolderPage> {
        self.token_manager.ensure_fresh().await?;

        let url = self.token_manager.endpoint(contents_uri);
        let page: FolderPage = self.get_xml(&url, &[("start", start)]).await?;

        tracing::debug!(
            "Listed {} (start={}): {} files, {} folders",
            url,
            start,
            page.files.len(),
            page.subfolders.len()
        );

        Ok(page)
    }

    /// Download a file's content. Uses the longer download timeout since the
    /// whole body is buffered in one request.
    pub async fn fetch_file_data(&self, file_data_uri: &str) -> Result<Bytes> {
        let url = self.token_manager.endpoint(file_data_uri);
        let response = self.get(&url, &[], Some(self.download_timeout)).await?;
        Ok(response.bytes().await?)
    }
}
