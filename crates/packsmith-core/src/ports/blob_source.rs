//! Fetching binary payloads referenced by URL.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from fetching a remote or inline payload.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unsupported source: {0}")]
    Unsupported(String),

    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(String),

    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(String),
}

/// Resolves a URL (`http(s)://` or `data:`) to its bytes.
#[async_trait]
pub trait BlobSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
