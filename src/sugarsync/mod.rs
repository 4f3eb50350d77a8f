/// Maximum number of combined files and collections the server returns per listing page.
pub const PAGE_SIZE: usize = 500;

/// Lifetime in minutes assumed for a freshly minted access token.
///
/// The server-declared expiration is ignored so no timezone parsing is involved.
pub const TOKEN_LIFETIME_MINUTES: i64 = 30;

pub mod auth;
pub mod client;
pub mod types;


pub use auth::{AccessGrant, Credentials, Session, TokenManager, BASE_URL};
pub use client::{ClientConfig, SugarSyncClient};
pub use types::{
    AppAuthorizationRequest, AuthorizationData, FileEntry, FolderPage, SubfolderRef, SyncFolder,
    SyncFolderList, TokenAuthRequest, UserProfile,
};
