//! Token management for SugarSync API authentication.
//!
//! A refresh token is minted once per run from the account credentials. It is
//! then exchanged for short-lived access tokens whenever the current one is
//! absent or past its expiry.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::sync::Arc;

use super::client::ClientConfig;
use super::types::{from_xml, to_xml, AppAuthorizationRequest, AuthorizationData, TokenAuthRequest};
use super::TOKEN_LIFETIME_MINUTES;
use crate::error::{AppError, Result};

/// Base URL for the SugarSync REST API.
pub const BASE_URL: &str = "https://api.sugarsync.com/";

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Static account and developer identity.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub app_id: String,
    pub public_key: String,
    pub private_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("app_id", &self.app_id)
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Current authentication state.
#[derive(Clone, Default)]
pub struct Session {
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub access_token_expiry: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
}

impl Session {
    /// An access token with no recorded expiry counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_token_expiry.map_or(true, |expiry| now >= expiry)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Session")
            .field("refresh_token", &redact(&self.refresh_token))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_expiry", &self.access_token_expiry)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Result of a successful access token acquisition.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub access_token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Owns the session and is the only component that mutates it.
#[derive(Clone)]
pub struct TokenManager {
    credentials: Credentials,
    base_url: String,
    http_client: Client,
    token_lifetime: Duration,
    session: Arc<RwLock<Session>>,
}

impl TokenManager {
    /// Create a new token manager with its own HTTP client.
    pub fn new(credentials: Credentials, config: &ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled");
        }

        Ok(Self {
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            token_lifetime: Duration::minutes(TOKEN_LIFETIME_MINUTES),
            session: Arc::new(RwLock::new(Session::default())),
        })
    }

    /// Override the lifetime assigned to newly acquired access tokens.
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Resolve an API path against the base URL. Absolute URIs pass through.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Start a request carrying the default headers but no access token.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header(USER_AGENT, APP_USER_AGENT)
            .header(CONTENT_TYPE, "application/xml")
    }

    /// Start a request carrying the default headers and the current access token.
    pub(crate) fn authorized(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.access_token()?;
        Ok(self.request(method, url).header(AUTHORIZATION, token))
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    /// The current access token, without checking its expiry.
    pub fn access_token(&self) -> Result<String> {
        self.session
            .read()
            .access_token
            .clone()
            .ok_or_else(|| AppError::Precondition("Access token not set".to_string()))
    }

    /// The user id learned during access token acquisition.
    pub fn user_id(&self) -> Result<String> {
        self.session
            .read()
            .user_id
            .clone()
            .ok_or_else(|| AppError::Precondition("User id not set".to_string()))
    }

    /// Acquire a refresh token and then a first access token.
    pub async fn authenticate(&self) -> Result<AccessGrant> {
        self.acquire_refresh_token().await?;
        self.acquire_access_token().await
    }

    /// Exchange the account credentials for a refresh token.
    pub async fn acquire_refresh_token(&self) -> Result<String> {
        tracing::info!("Requesting refresh token for {}", self.credentials.username);

        let body = to_xml(&AppAuthorizationRequest {
            username: self.credentials.username.clone(),
            password: self.credentials.password.clone(),
            application: self.credentials.app_id.clone(),
            access_key_id: self.credentials.public_key.clone(),
            private_access_key: self.credentials.private_key.clone(),
        })?;

        let response = self
            .request(Method::POST, &self.endpoint("app-authorization"))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if is_error_status(status) {
            return Err(AppError::Auth(format!(
                "Failed to authorize app (status: {})",
                status
            )));
        }

        let refresh_token = location(&response).ok_or_else(|| {
            AppError::Protocol("No refresh token in app-authorization response".to_string())
        })?;

        self.session.write().refresh_token = Some(refresh_token.clone());
        tracing::debug!("Acquired refresh token");

        Ok(refresh_token)
    }

    /// Exchange the held refresh token for a new access token.
    pub async fn acquire_access_token(&self) -> Result<AccessGrant> {
        let refresh_token = {
            let mut session = self.session.write();
            session.access_token = None;
            session.refresh_token.clone()
        }
        .ok_or_else(|| AppError::Precondition("Refresh token not set".to_string()))?;

        let body = to_xml(&TokenAuthRequest {
            access_key_id: self.credentials.public_key.clone(),
            private_access_key: self.credentials.private_key.clone(),
            refresh_token,
        })?;

        let response = self
            .request(Method::POST, &self.endpoint("authorization"))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if is_error_status(status) {
            return Err(AppError::Auth(format!(
                "Failed to claim access token (status: {})",
                status
            )));
        }

        let access_token = location(&response)
            .ok_or_else(|| AppError::Protocol("Unable to get access token".to_string()))?;

        let text = response.text().await?;
        let data: AuthorizationData = from_xml(&text).map_err(|e| {
            AppError::Protocol(format!("Malformed authorization response: {}", e))
        })?;
        let user_id = data.user_id().ok_or_else(|| {
            AppError::Protocol("No user reference in authorization response".to_string())
        })?;

        let expires_at = Utc::now() + self.token_lifetime;

        {
            let mut session = self.session.write();
            session.access_token = Some(access_token.clone());
            session.access_token_expiry = Some(expires_at);
            session.user_id = Some(user_id.clone());
        }

        tracing::info!("Acquired access token, expires at {}", expires_at);

        Ok(AccessGrant {
            access_token,
            user_id,
            expires_at,
        })
    }

    /// Renew the access token if it is absent or expired.
    ///
    /// The refresh token is never renewed; this is the only re-authentication path.
    pub async fn ensure_fresh(&self) -> Result<()> {
        let stale = {
            let session = self.session.read();
            session.access_token.is_none() || session.is_expired(Utc::now())
        };

        if stale {
            tracing::info!("Refreshing access token");
            self.acquire_access_token().await?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("session", &*self.session.read())
            .finish()
    }
}

/// Anything at or above 300 is treated as a failure.
pub(crate) fn is_error_status(status: StatusCode) -> bool {
    status.as_u16() >= 300
}

fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
