//! Error types for token lifecycle operations
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid grant: {0}")]
    ConfigurationError(String),

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("token refresh timed out")]
    Timeout,

    #[error("invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("unknown session: {0}")]
    UnknownSession(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
