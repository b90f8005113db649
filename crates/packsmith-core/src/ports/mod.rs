//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` or `reqwest` types in any signature
//! - Generator ports speak in data URLs and plain URLs, never SDK types
//! - Every generator failure crosses the boundary as [`GenerationError`]

pub mod blob_source;
pub mod chat_generator;
pub mod image_generator;
pub mod model_generator;
pub mod state_repository;

use thiserror::Error;

use crate::geometry::dieline::GeometryError;
use crate::prompts::PromptError;

pub use blob_source::{BlobSource, FetchError};
pub use chat_generator::{ChatGenerator, ChatRequest, ChatTask};
pub use image_generator::{ImageGenerator, ImageRequest, ImageWorkflow};
pub use model_generator::{
    ModelGenerator, ModelProgress, ModelRequest, MultiImageAlgo, NoopProgress, ProgressSink,
    TrellisParams,
};
pub use state_repository::StateRepository;

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and provides a clean interface for services to handle storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failure reported by an image, chat or 3D generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The client has no credentials or was never set up.
    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    /// Upstream rate limit or quota exhausted.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Prompt or output blocked by a safety filter.
    #[error("Blocked by safety filters: {0}")]
    Safety(String),

    /// The request was rejected before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream answered with an error.
    #[error("Upstream error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Upstream { status: Option<u16>, message: String },

    /// Upstream answered but without a usable result.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// Polling gave up.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Transport failure.
    #[error("Network error: {0}")]
    Network(String),
}

impl GenerationError {
    /// Short class name used when recording failures in session state.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "NotConfigured",
            Self::QuotaExceeded(_) => "QuotaExceeded",
            Self::Safety(_) => "SafetyError",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::Upstream { .. } => "UpstreamError",
            Self::EmptyResult(_) => "EmptyResult",
            Self::Timeout(_) => "Timeout",
            Self::Network(_) => "NetworkError",
        }
    }
}

/// Core error type for semantic domain errors.
///
/// This is the canonical error type used across the core domain.
/// Adapters should map this to their own error types (HTTP status codes,
/// CLI exit codes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A generator port failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The user's prompt was rejected.
    #[error("Your prompt needs improvement: {0}")]
    Prompt(#[from] PromptError),

    /// Dimensions cannot produce a dieline or mesh.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Validation error (invalid input).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another generation is already running.
    #[error("{0}")]
    Conflict(String),

    /// Entity not found.
    #[error("{0}")]
    NotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (unexpected condition).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short class name used when recording failures in session state.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Repository(_) => "RepositoryError",
            Self::Generation(e) => e.kind(),
            Self::Prompt(_) => "PromptError",
            Self::Geometry(_) => "GeometryError",
            Self::Validation(_) => "ValidationError",
            Self::Conflict(_) => "Conflict",
            Self::NotFound(_) => "NotFound",
            Self::Configuration(_) => "ConfigurationError",
            Self::Internal(_) => "InternalError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_includes_status_when_known() {
        let with = GenerationError::Upstream {
            status: Some(502),
            message: "bad gateway".into(),
        };
        assert_eq!(with.to_string(), "Upstream error (502): bad gateway");
        let without = GenerationError::Upstream {
            status: None,
            message: "reset".into(),
        };
        assert_eq!(without.to_string(), "Upstream error: reset");
    }

    #[test]
    fn core_error_kind_delegates_to_generation() {
        let err = CoreError::from(GenerationError::QuotaExceeded("daily".into()));
        assert_eq!(err.kind(), "QuotaExceeded");
        assert_eq!(err.to_string(), "Quota exceeded: daily");
    }
}
