//! Key/value persistence for session documents.
//!
//! Every session document (product state, product status, packaging state,
//! Trellis job status) is stored as one JSON value under a well-known key.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::RepositoryError;

/// Key of the product session document.
pub const PRODUCT_STATE_KEY: &str = "product:current";
/// Key of the poll-friendly product status.
pub const PRODUCT_STATUS_KEY: &str = "product_status:current";
/// Key of the packaging session document.
pub const PACKAGING_STATE_KEY: &str = "packaging:current";
/// Key of the last direct Trellis job status.
pub const TRELLIS_STATUS_KEY: &str = "trellis_status:current";
/// Lifetime of the Trellis job status.
pub const TRELLIS_STATUS_TTL: Duration = Duration::from_secs(3600);

/// Repository for JSON documents keyed by string.
///
/// # Design Rules
///
/// - No `sqlx` types in signatures
/// - Expired entries behave exactly like missing ones
/// - Writes replace the whole document (last write wins)
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Load a document, or `None` when absent or expired.
    async fn get_json(&self, key: &str) -> Result<Option<Value>, RepositoryError>;

    /// Store a document, optionally expiring after `ttl`.
    async fn set_json(
        &self,
        key: &str,
        value: &Value,
        ttl: Option<Duration>,
    ) -> Result<(), RepositoryError>;

    /// Remove a document. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), RepositoryError>;
}
