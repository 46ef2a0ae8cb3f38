//! Error types for ocrd-fetch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Not found: {url} (HTTP 404)")]
    NotFound { url: String },

    #[error("HTTP request failed: {url} (HTTP {status})")]
    Status { url: String, status: u16 },

    #[error("transport error while fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("invalid proxy URL {url}: {message}")]
    Proxy { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl FetchError {
    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
