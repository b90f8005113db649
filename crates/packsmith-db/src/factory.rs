//! Composition helpers for building `AppCore` on a `SQLite` pool.

use std::sync::Arc;

use sqlx::SqlitePool;

use packsmith_core::ports::{ChatGenerator, ImageGenerator, ModelGenerator};
use packsmith_core::services::{AppCore, Ports};

use crate::repositories::SqliteStateRepository;

/// Construction only; no domain logic lives here.
pub struct CoreFactory;

impl CoreFactory {
    pub fn state_repository(pool: SqlitePool) -> Arc<SqliteStateRepository> {
        Arc::new(SqliteStateRepository::new(pool))
    }

    /// Compose an `AppCore` whose session documents live in `pool`.
    ///
    /// ```ignore
    /// let pool = setup_database(&config.db_path).await?;
    /// let core = CoreFactory::build_app_core(pool, images, chat, models);
    /// ```
    pub fn build_app_core(
        pool: SqlitePool,
        images: Arc<dyn ImageGenerator>,
        chat: Arc<dyn ChatGenerator>,
        models: Arc<dyn ModelGenerator>,
    ) -> AppCore {
        AppCore::new(Ports {
            state: Self::state_repository(pool),
            images,
            chat,
            models,
        })
    }
}
