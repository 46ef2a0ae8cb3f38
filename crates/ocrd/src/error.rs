use ocrd_fetch::FetchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required argument is missing or empty.
    #[error("{0}")]
    Argument(String),

    #[error("Not found: {url}")]
    NotFound { url: String },

    /// The destination is populated and the clobber policy forbids
    /// overwriting it.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Ownership(String),

    #[error("could not reach {url}: {message}")]
    Transport { url: String, message: String },

    #[error("request for {url} failed with HTTP {status}")]
    Http { url: String, status: u16 },

    #[error(transparent)]
    Fetch(FetchError),

    #[error(transparent)]
    Fs(#[from] ocrd_fs::Error),

    #[error(transparent)]
    Models(ocrd_models::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("failed to encode configuration: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<FetchError> for Error {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::NotFound { url } => Self::NotFound { url },
            FetchError::Transport { url, message } => Self::Transport { url, message },
            FetchError::Status { url, status } => Self::Http { url, status },
            FetchError::InvalidUrl(url) => Self::Argument(format!("invalid URL: {url}")),
            other => Self::Fetch(other),
        }
    }
}

impl From<ocrd_models::Error> for Error {
    fn from(e: ocrd_models::Error) -> Self {
        match e {
            ocrd_models::Error::Ownership { .. } => Self::Ownership(e.to_string()),
            other => Self::Models(other),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
