//! Mapping from core and cache errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use packsmith_assets::AssetError;
use packsmith_core::{CoreError, FetchError, GenerationError};
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Another generation is already running.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A generator is not configured.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An upstream generator failed.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl HttpError {
    const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Conflict(msg)
            | Self::ServiceUnavailable(msg)
            | Self::BadGateway(msg)
            | Self::Internal(msg) => msg,
        };
        let body = ErrorBody {
            error,
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Conflict(msg) => Self::Conflict(msg),
            CoreError::NotFound(msg) => Self::NotFound(msg),
            CoreError::Validation(msg) => Self::BadRequest(msg),
            e @ (CoreError::Prompt(_) | CoreError::Geometry(_)) => Self::BadRequest(e.to_string()),
            CoreError::Generation(e) => e.into(),
            e @ (CoreError::Repository(_)
            | CoreError::Configuration(_)
            | CoreError::Internal(_)) => Self::Internal(e.to_string()),
        }
    }
}

impl From<GenerationError> for HttpError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::NotConfigured(_) => Self::ServiceUnavailable(err.to_string()),
            GenerationError::InvalidRequest(_) => Self::BadRequest(err.to_string()),
            _ => Self::BadGateway(err.to_string()),
        }
    }
}

impl From<AssetError> for HttpError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::Fetch(FetchError::Status { status: 404, url }) => {
                Self::NotFound(format!("Asset no longer available upstream: {url}"))
            }
            AssetError::Fetch(e) => Self::BadGateway(e.to_string()),
            e @ (AssetError::Io { .. } | AssetError::Client(_)) => Self::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packsmith_core::PromptError;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::Conflict("busy".into()), StatusCode::CONFLICT),
            (CoreError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (CoreError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                CoreError::Generation(GenerationError::QuotaExceeded("x".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                CoreError::Generation(GenerationError::NotConfigured("x".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (CoreError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(HttpError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn prompt_errors_are_bad_requests() {
        let err = HttpError::from(CoreError::Prompt(PromptError::TooShort));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_404_is_not_found() {
        let err = HttpError::from(AssetError::Fetch(FetchError::Status {
            status: 404,
            url: "https://cdn/x".into(),
        }));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
