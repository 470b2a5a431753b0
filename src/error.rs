//! Error types for the publishing client.

use thiserror::Error;

/// The main error type for authorization, storage and API operations.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Cannot be executed outside of word")]
    NotInHost,

    #[error("No token received")]
    NoTokenReceived,

    #[error("Authorization rejected: {0}")]
    Rejected(serde_json::Value),

    #[error("Unable to parse token")]
    UnableToParseToken,

    #[error("Authorization dialog closed before a callback was received")]
    DialogClosed,

    #[error("Not signed in to GitHub; run `login` first")]
    NotAuthenticated,

    #[error("GitHub API error: {message}")]
    GitHub { message: String },

    #[error("Not found on GitHub: {message}")]
    NotFound { message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {message}")]
    Storage { message: String },
}

/// A specialized Result type for publishing operations.
pub type Result<T> = std::result::Result<T, PublishError>;
