//! SugarSync API request and response types.
//!
//! All bodies are XML. Repeated elements (`file`, `collection`) decode into
//! `Vec`, so a listing with one entry and a listing with many look the same to
//! callers, and a missing element is an empty list.

use serde::{Deserialize, Serialize};

use super::PAGE_SIZE;
use crate::error::Result;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>"#;

/// Serialize a request body, prefixed with the XML declaration.
pub fn to_xml<T: Serialize>(body: &T) -> Result<String> {
    let xml = quick_xml::se::to_string(body).map_err(|e| {
        crate::error::AppError::Internal(format!("Failed to serialize request body: {}", e))
    })?;
    Ok(format!("{}{}", XML_DECLARATION, xml))
}

/// Decode a response body.
pub fn from_xml<T: serde::de::DeserializeOwned>(xml: &str) -> Result<T> {
    Ok(quick_xml::de::from_str(xml)?)
}

// ============================================================================
// Authentication
// ============================================================================

/// Request body for creating a refresh token.
#[derive(Debug, Serialize)]
#[serde(rename = "appAuthorization", rename_all = "camelCase")]
pub struct AppAuthorizationRequest {
    pub username: String,
    pub password: String,
    pub application: String,
    pub access_key_id: String,
    pub private_access_key: String,
}

/// Request body for creating an access token.
#[derive(Debug, Serialize)]
#[serde(rename = "tokenAuthRequest", rename_all = "camelCase")]
pub struct TokenAuthRequest {
    pub access_key_id: String,
    pub private_access_key: String,
    pub refresh_token: String,
}

/// Response body for access token creation.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthorizationData {
    /// URI of the user resource, e.g. `https://api.sugarsync.com/user/566494`
    #[serde(default)]
    pub user: Option<String>,
}

impl AuthorizationData {
    /// The user id is the last path segment of the user reference.
    pub fn user_id(&self) -> Option<String> {
        let user = self.user.as_deref()?.trim().trim_end_matches('/');
        let id = user.rsplit('/').next()?;
        (!id.is_empty()).then(|| id.to_string())
    }
}

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct UserData {
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    pub quota: QuotaData,
    pub syncfolders: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuotaData {
    pub limit: u64,
    pub usage: u64,
}

/// Account metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
    pub nickname: String,
    pub quota_usage_bytes: u64,
    pub quota_limit_bytes: u64,
    pub sync_folders_uri: String,
}

impl UserProfile {
    pub(crate) fn from_data(user_id: String, data: UserData) -> Self {
        Self {
            user_id,
            username: data.username,
            nickname: data.nickname,
            quota_usage_bytes: data.quota.usage,
            quota_limit_bytes: data.quota.limit,
            sync_folders_uri: data.syncfolders,
        }
    }

    pub fn usage_mb(&self) -> u64 {
        self.quota_usage_bytes / (1024 * 1024)
    }

    pub fn limit_mb(&self) -> u64 {
        self.quota_limit_bytes / (1024 * 1024)
    }
}

// ============================================================================
// Collections
// ============================================================================

/// A top-level synchronized folder.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncFolder {
    pub display_name: String,
    /// URI listing this folder's files and subfolders
    #[serde(rename = "contents")]
    pub contents_uri: String,
}

/// Response body of the sync folders collection.
#[derive(Debug, Deserialize, Default)]
pub struct SyncFolderList {
    #[serde(rename = "collection", default)]
    pub folders: Vec<SyncFolder>,
}

/// A subfolder inside a folder listing.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubfolderRef {
    pub display_name: String,
    #[serde(rename = "contents")]
    pub contents_uri: String,
}

/// A remote file inside a folder listing.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub display_name: String,
    #[serde(rename = "fileData", default)]
    pub file_data_uri: String,
    #[serde(default)]
    pub present_on_server: bool,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// One page of a folder listing.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FolderPage {
    #[serde(rename = "file", default)]
    pub files: Vec<FileEntry>,
    #[serde(rename = "collection", default)]
    pub subfolders: Vec<SubfolderRef>,
}

impl FolderPage {
    /// Combined number of files and subfolders on this page.
    pub fn item_count(&self) -> usize {
        self.files.len() + self.subfolders.len()
    }

    /// A full page means the server may hold more items at the next offset.
    pub fn has_next_page(&self) -> bool {
        self.item_count() >= PAGE_SIZE
    }
}
