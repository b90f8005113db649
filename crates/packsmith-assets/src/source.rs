//! Resolves `http(s)://` and `data:` URLs to bytes.

use std::time::Duration;

use async_trait::async_trait;
use packsmith_core::data_url::{self, DataUrl};
use packsmith_core::{BlobSource, FetchError};
use tracing::debug;
use url::Url;

use crate::error::AssetResult;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Downloads remote payloads with reqwest and decodes inline ones.
pub struct HttpBlobSource {
    client: reqwest::Client,
}

impl HttpBlobSource {
    pub fn new() -> AssetResult<Self> {
        Self::with_timeout(DOWNLOAD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> AssetResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BlobSource for HttpBlobSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if data_url::is_data_url(url) {
            return DataUrl::parse(url)
                .map(|decoded| decoded.bytes)
                .ok_or_else(|| FetchError::MalformedDataUrl(truncate(url)));
        }

        let parsed = Url::parse(url).map_err(|_| FetchError::Unsupported(truncate(url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::Unsupported(parsed.scheme().to_string()));
        }

        debug!(target: "packsmith.assets", url = %parsed, "Downloading asset");
        let response = self
            .client
            .get(parsed.as_str())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn truncate(url: &str) -> String {
    url.chars().take(64).collect()
}

/// Best-effort content type from leading magic bytes.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'g', b'l', b'T', b'F', ..] => "model/gltf-binary",
        _ => "application/octet-stream",
    }
}
