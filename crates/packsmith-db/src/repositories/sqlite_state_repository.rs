//! `SQLite` implementation of the `StateRepository` trait.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use packsmith_core::{RepositoryError, StateRepository};

fn storage(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

/// Key-value table of JSON documents with optional expiry.
///
/// Expired rows are treated as absent and removed lazily on read.
#[derive(Clone)]
pub struct SqliteStateRepository {
    pool: SqlitePool,
}

impl SqliteStateRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Delete every expired row. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM kv_store WHERE expires_at IS NOT NULL AND expires_at <= ?")
                .bind(Utc::now().timestamp())
                .execute(&self.pool)
                .await
                .map_err(storage)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StateRepository for SqliteStateRepository {
    async fn get_json(&self, key: &str) -> Result<Option<Value>, RepositoryError> {
        let row = sqlx::query("SELECT value, expires_at FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let expires_at: Option<i64> = row.get("expires_at");
        if expires_at.is_some_and(|at| at <= Utc::now().timestamp()) {
            debug!(target: "packsmith.db", key, "Dropping expired document");
            self.delete(key).await?;
            return Ok(None);
        }

        let json: String = row.get("value");
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    async fn set_json(
        &self,
        key: &str,
        value: &Value,
        ttl: Option<Duration>,
    ) -> Result<(), RepositoryError> {
        let json =
            serde_json::to_string(value)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let now = Utc::now();
        let expires_at = ttl.map(|ttl| {
            now.timestamp()
                .saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
        });

        sqlx::query(
            "INSERT OR REPLACE INTO kv_store (key, value, expires_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(key)
        .bind(&json)
        .bind(expires_at)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }
}
