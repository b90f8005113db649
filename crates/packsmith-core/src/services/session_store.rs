//! Typed access to the single-session documents.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::{PackagingState, ProductState, ProductStatus};
use crate::ports::state_repository::{
    PACKAGING_STATE_KEY, PRODUCT_STATE_KEY, PRODUCT_STATUS_KEY,
};
use crate::ports::{RepositoryError, StateRepository};

/// Loads and saves session documents through a [`StateRepository`].
///
/// `update_*` methods run read-modify-write under one lock so concurrent
/// background tasks in this process never lose each other's changes.
/// Plain `save_*` calls are last-write-wins.
#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn StateRepository>,
    write_lock: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(repo: Arc<dyn StateRepository>) -> Self {
        Self {
            repo,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load a document, falling back to its default when missing.
    ///
    /// A document that no longer matches its schema is logged and replaced
    /// by the default rather than failing every request.
    pub async fn get_document<T>(&self, key: &str) -> Result<T, RepositoryError>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.get_optional(key).await?.unwrap_or_default())
    }

    /// Load a document if one is stored.
    pub async fn get_optional<T>(&self, key: &str) -> Result<Option<T>, RepositoryError>
    where
        T: DeserializeOwned,
    {
        let Some(value) = self.repo.get_json(key).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                warn!(
                    target: "packsmith.store",
                    key,
                    error = %e,
                    "Discarding unreadable session document"
                );
                Ok(None)
            }
        }
    }

    pub async fn put_document<T>(
        &self,
        key: &str,
        doc: &T,
        ttl: Option<Duration>,
    ) -> Result<(), RepositoryError>
    where
        T: Serialize + Sync,
    {
        let value =
            serde_json::to_value(doc).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.repo.set_json(key, &value, ttl).await
    }

    // ---- product ----

    pub async fn product(&self) -> Result<ProductState, RepositoryError> {
        self.get_document(PRODUCT_STATE_KEY).await
    }

    pub async fn save_product(&self, state: &mut ProductState) -> Result<(), RepositoryError> {
        state.updated_at = Utc::now();
        self.put_document(PRODUCT_STATE_KEY, state, None).await
    }

    /// Apply `f` to the stored product state and persist the result.
    pub async fn update_product<R>(
        &self,
        f: impl FnOnce(&mut ProductState) -> R + Send,
    ) -> Result<(R, ProductState), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.product().await?;
        let out = f(&mut state);
        self.save_product(&mut state).await?;
        Ok((out, state))
    }

    pub async fn product_status(&self) -> Result<ProductStatus, RepositoryError> {
        self.get_document(PRODUCT_STATUS_KEY).await
    }

    /// Overwrite the status payload.
    pub async fn replace_product_status(
        &self,
        status: &ProductStatus,
    ) -> Result<(), RepositoryError> {
        self.put_document(PRODUCT_STATUS_KEY, status, None).await
    }

    /// Merge an update into the stored status (see [`ProductStatus::merge`]).
    pub async fn merge_product_status(
        &self,
        update: ProductStatus,
    ) -> Result<ProductStatus, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.product_status().await?;
        stored.merge(update);
        self.put_document(PRODUCT_STATUS_KEY, &stored, None).await?;
        Ok(stored)
    }

    // ---- packaging ----

    pub async fn packaging(&self) -> Result<PackagingState, RepositoryError> {
        self.get_document(PACKAGING_STATE_KEY).await
    }

    /// Apply `f` to the stored packaging state and persist the result.
    pub async fn update_packaging<R>(
        &self,
        f: impl FnOnce(&mut PackagingState) -> R + Send,
    ) -> Result<(R, PackagingState), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.packaging().await?;
        let out = f(&mut state);
        state.updated_at = Utc::now();
        self.put_document(PACKAGING_STATE_KEY, &state, None).await?;
        Ok((out, state))
    }

    /// Replace the packaging document with a fresh default.
    pub async fn clear_packaging(&self) -> Result<PackagingState, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let state = PackagingState::default();
        self.put_document(PACKAGING_STATE_KEY, &state, None).await?;
        Ok(state)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory repository shared by service tests.
    #[derive(Default)]
    pub struct MemoryRepo {
        pub docs: StdMutex<HashMap<String, (Value, Option<Duration>)>>,
    }

    #[async_trait]
    impl StateRepository for MemoryRepo {
        async fn get_json(&self, key: &str) -> Result<Option<Value>, RepositoryError> {
            Ok(self.docs.lock().unwrap().get(key).map(|(v, _)| v.clone()))
        }

        async fn set_json(
            &self,
            key: &str,
            value: &Value,
            ttl: Option<Duration>,
        ) -> Result<(), RepositoryError> {
            self.docs
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.clone(), ttl));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
            self.docs.lock().unwrap().remove(key);
            Ok(())
        }
    }

    /// Rejects writes while `failing` is set, or the single write numbered
    /// `fail_write` (zero based).
    #[derive(Default)]
    pub struct FlakyRepo {
        pub inner: MemoryRepo,
        pub failing: AtomicBool,
        pub fail_write: Option<usize>,
        pub(crate) writes: AtomicUsize,
    }

    #[async_trait]
    impl StateRepository for FlakyRepo {
        async fn get_json(&self, key: &str) -> Result<Option<Value>, RepositoryError> {
            self.inner.get_json(key).await
        }

        async fn set_json(
            &self,
            key: &str,
            value: &Value,
            ttl: Option<Duration>,
        ) -> Result<(), RepositoryError> {
            let n = self.writes.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) || self.fail_write == Some(n) {
                return Err(RepositoryError::Storage("disk full".into()));
            }
            self.inner.set_json(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
            self.inner.delete(key).await
        }
    }

    pub fn memory_store() -> (Arc<MemoryRepo>, SessionStore) {
        let repo = Arc::new(MemoryRepo::default());
        (repo.clone(), SessionStore::new(repo))
    }

    #[tokio::test]
    async fn missing_documents_default() {
        let (_, store) = memory_store();
        assert_eq!(store.product().await.unwrap().status, "idle");
        assert!(!store.packaging().await.unwrap().is_generating());
    }

    #[tokio::test]
    async fn unreadable_document_falls_back_to_default() {
        let (repo, store) = memory_store();
        repo.set_json(PRODUCT_STATE_KEY, &serde_json::json!({"images": 42}), None)
            .await
            .unwrap();
        assert!(store.product().await.unwrap().images.is_empty());
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let (_, store) = memory_store();
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_packaging(|s| s.generating_panels.push(format!("p{i}")))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.packaging().await.unwrap().generating_panels.len(), 16);
    }

    #[tokio::test]
    async fn merge_status_persists() {
        let (_, store) = memory_store();
        let mut done = ProductStatus::stage("complete", 100, "3D asset generated");
        done.model_file = Some("https://cdn.local/m.glb".into());
        store.merge_product_status(done).await.unwrap();
        store
            .merge_product_status(ProductStatus::stage("pending", 0, "again"))
            .await
            .unwrap();
        let status = store.product_status().await.unwrap();
        assert_eq!(status.status, "pending");
        assert_eq!(status.model_file.as_deref(), Some("https://cdn.local/m.glb"));
    }
}
