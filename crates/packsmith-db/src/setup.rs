//! Database setup and initialization.
//!
//! The schema is a single `kv_store` table of JSON documents. Opening a
//! database creates the file and table when missing and drops documents whose
//! expiry has already passed.

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::path::Path;
use tracing::info;

use crate::repositories::SqliteStateRepository;

/// Open (creating if needed) the database file and ensure the schema exists.
///
/// This function:
/// 1. Creates the parent directory and the database file if missing
/// 2. Creates the `kv_store` table and its expiry index
/// 3. Purges documents whose expiry passed while the service was down
///
/// # Arguments
///
/// * `db_path` - Path to the `SQLite` database file
///
/// # Errors
///
/// Returns an error if:
/// - The directory or database file cannot be created or opened
/// - Schema creation or the expiry purge fails
///
/// # Example
///
/// ```rust,no_run
/// use packsmith_db::setup_database;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let pool = setup_database(Path::new("data/packsmith.db")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn setup_database(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true),
    )
    .await?;

    create_schema(&pool).await?;
    let purged = SqliteStateRepository::new(pool.clone()).purge_expired().await?;
    if purged > 0 {
        info!(target: "packsmith.db", purged, "Purged expired session documents");
    }
    Ok(pool)
}

/// In-memory database with the production schema.
#[cfg(any(test, feature = "test-utils"))]
pub async fn setup_test_database() -> Result<SqlitePool> {
    let pool = SqlitePool::connect("sqlite::memory:").await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Safe to call repeatedly; every statement uses IF NOT EXISTS.
async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // JSON documents keyed by name; expires_at is unix seconds
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            expires_at INTEGER,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_kv_store_expires_at ON kv_store(expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_file_and_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/packsmith.db");
        let pool = setup_database(&path).await.unwrap();
        assert!(path.exists());

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kv_store")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn reopening_purges_expired_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("packsmith.db");
        {
            let pool = setup_database(&path).await.unwrap();
            for (key, expires_at) in [("stale", Some(1_i64)), ("kept", None)] {
                sqlx::query(
                    "INSERT INTO kv_store (key, value, expires_at, updated_at) VALUES (?, '{}', ?, '')",
                )
                .bind(key)
                .bind(expires_at)
                .execute(&pool)
                .await
                .unwrap();
            }
            pool.close().await;
        }

        let pool = setup_database(&path).await.unwrap();
        let keys: Vec<(String,)> = sqlx::query_as("SELECT key FROM kv_store")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(keys, vec![("kept".to_string(),)]);
    }

    #[tokio::test]
    async fn schema_setup_is_idempotent() {
        let pool = setup_test_database().await.unwrap();
        create_schema(&pool).await.unwrap();
    }
}
