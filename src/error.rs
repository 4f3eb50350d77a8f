//! Error types for the sugarsync-dl application.

use reqwest::StatusCode;

/// Application-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Error status from one of the authentication endpoints
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Success status, but the response lacks a field we rely on
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error status from a data-fetching call
    #[error("Transfer failed with status {status}: {url}")]
    Transfer { status: StatusCode, url: String },

    /// A token operation was invoked out of order
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// HTTP client error
    #[error("HTTP request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML decoding error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    /// Remote timestamp that could not be parsed
    #[error("Invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    /// Remote display name that cannot be used as a local path segment
    #[error("Invalid display name: {0:?}")]
    InvalidName(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error must abort the whole run.
    ///
    /// Everything else is contained by the per-file and per-subfolder
    /// boundaries of the traversal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Auth(_) | AppError::Protocol(_) | AppError::Precondition(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
