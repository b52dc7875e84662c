//! Error types for the InvestAfrik client

use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (offline, DNS, connection reset, ...)
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A 401 was received and there was no refresh token to recover with.
    /// The session has been cleared.
    #[error("Authentication expired")]
    AuthExpired,

    /// The refresh endpoint rejected the refresh token or could not be reached.
    /// The session has been cleared.
    #[error("Token refresh failed: {0}")]
    RefreshFailure(String),

    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
