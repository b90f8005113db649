//! Internal error types for fal.ai calls.

use std::time::Duration;

use packsmith_core::GenerationError;
use thiserror::Error;

pub type FalResult<T> = Result<T, FalError>;

#[derive(Debug, Error)]
pub enum FalError {
    #[error("FAL_KEY is not configured")]
    NotConfigured,

    #[error("No images provided")]
    NoImages,

    #[error("fal.ai request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// The queue reported a state this client does not know.
    #[error("fal.ai job failed: {0}")]
    JobFailed(String),

    #[error("No valid output received from fal.ai: {0}")]
    MissingOutput(String),

    #[error("Trellis job did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<FalError> for GenerationError {
    fn from(err: FalError) -> Self {
        match err {
            FalError::NotConfigured => Self::NotConfigured("FAL_KEY is not configured".into()),
            FalError::NoImages => Self::InvalidRequest("No images provided".into()),
            FalError::Api { status: 429, message } => Self::QuotaExceeded(message),
            FalError::Api {
                status: 400 | 422,
                message,
            } => Self::InvalidRequest(message),
            FalError::Api { status, message } => Self::Upstream {
                status: Some(status),
                message,
            },
            FalError::JobFailed(message) => Self::Upstream {
                status: None,
                message,
            },
            FalError::MissingOutput(message) => Self::EmptyResult(message),
            e @ FalError::Timeout(_) => Self::Timeout(e.to_string()),
            FalError::Network(e) if e.is_timeout() => Self::Timeout(e.to_string()),
            FalError::Network(e) => Self::Network(e.to_string()),
            FalError::InvalidUrl(e) => Self::NotConfigured(e.to_string()),
            FalError::JsonParse(e) => Self::Upstream {
                status: None,
                message: e.to_string(),
            },
        }
    }
}
