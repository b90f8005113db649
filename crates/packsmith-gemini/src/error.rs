//! Internal error types for Gemini calls, mapped to port errors at the boundary.

use packsmith_core::GenerationError;
use thiserror::Error;

pub type GeminiResult<T> = Result<T, GeminiError>;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini API key is not configured")]
    NotConfigured,

    /// Non-success HTTP status.
    #[error("Gemini API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// Prompt or output stopped by a safety filter.
    #[error("Gemini blocked the request: {reason}")]
    Blocked { reason: String },

    /// The response had no usable image or text.
    #[error("Gemini returned no {0}")]
    Missing(&'static str),

    #[error("Invalid input image: {0}")]
    InvalidImage(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<GeminiError> for GenerationError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::NotConfigured => {
                Self::NotConfigured("Gemini API key is not configured".into())
            }
            GeminiError::Api { status: 429, message } => Self::QuotaExceeded(message),
            GeminiError::Api { status: 400, message } => Self::InvalidRequest(message),
            GeminiError::Api { status, message } => Self::Upstream {
                status: Some(status),
                message,
            },
            GeminiError::Blocked { reason } => Self::Safety(reason),
            GeminiError::Missing(what) => Self::EmptyResult(format!("Gemini returned no {what}")),
            GeminiError::InvalidImage(message) => Self::InvalidRequest(message),
            GeminiError::Network(e) if e.is_timeout() => Self::Timeout(e.to_string()),
            GeminiError::Network(e) => Self::Network(e.to_string()),
            GeminiError::InvalidUrl(e) => Self::NotConfigured(e.to_string()),
            GeminiError::JsonParse(e) => Self::Upstream {
                status: None,
                message: e.to_string(),
            },
        }
    }
}
