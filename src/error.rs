// Error types for the Magento API client.
// Covers signing, cache filesystem, and request construction failures.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cache directory {path} is not usable: {source}")]
    CacheDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("query parameter {0:?} collides with a reserved oauth_* field")]
    ReservedParameter(String),

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
