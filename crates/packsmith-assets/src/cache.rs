//! Two-tier cache: bounded memory in front of a directory of `.bin` files.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use packsmith_core::BlobSource;
use tracing::{debug, info, warn};

use crate::error::{AssetError, AssetResult};
use crate::key::AssetKey;
use crate::memory::MemoryTier;

/// 256 MiB
pub const DEFAULT_MEMORY_BYTES: usize = 256 * 1024 * 1024;

/// Serves asset bytes from memory, then disk, then the source.
///
/// Concurrent misses for the same key may both hit the source; the last
/// write wins in both tiers.
pub struct AssetCache {
    memory: Mutex<MemoryTier>,
    dir: PathBuf,
    source: Arc<dyn BlobSource>,
}

impl AssetCache {
    pub fn new(dir: impl Into<PathBuf>, source: Arc<dyn BlobSource>) -> Self {
        Self::with_memory_limit(dir, source, DEFAULT_MEMORY_BYTES)
    }

    pub fn with_memory_limit(
        dir: impl Into<PathBuf>,
        source: Arc<dyn BlobSource>,
        max_bytes: usize,
    ) -> Self {
        Self {
            memory: Mutex::new(MemoryTier::new(max_bytes)),
            dir: dir.into(),
            source,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn memory(&self) -> MutexGuard<'_, MemoryTier> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the bytes for `key`, fetching `source_url` on a full miss.
    pub async fn get_or_fetch(&self, key: &AssetKey, source_url: &str) -> AssetResult<Arc<[u8]>> {
        if let Some(hit) = self.memory().get(key) {
            debug!(target: "packsmith.assets", %key, "Memory hit");
            return Ok(hit);
        }

        let path = key.disk_path(&self.dir);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(target: "packsmith.assets", %key, "Disk hit");
                let data: Arc<[u8]> = bytes.into();
                self.memory().insert(key.clone(), data.clone());
                return Ok(data);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    target: "packsmith.assets",
                    %key,
                    path = %path.display(),
                    error = %e,
                    "Unreadable cache file, refetching"
                );
            }
        }

        let bytes = self.source.fetch(source_url).await?;
        info!(target: "packsmith.assets", %key, kb = bytes.len() / 1024, "Fetched asset");
        if let Err(e) = write_atomic(&path, &bytes).await {
            warn!(target: "packsmith.assets", %key, error = %e, "Failed to persist asset");
        }
        let data: Arc<[u8]> = bytes.into();
        self.memory().insert(key.clone(), data.clone());
        Ok(data)
    }

    /// Drop `key` from both tiers.
    pub async fn invalidate(&self, key: &AssetKey) -> AssetResult<()> {
        self.memory().remove(key);
        let path = key.disk_path(&self.dir);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AssetError::Io { path, source }),
        }
    }

    /// Empty both tiers.
    pub async fn clear(&self) -> AssetResult<()> {
        self.memory().clear();
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AssetError::Io {
                path: self.dir.clone(),
                source,
            }),
        }
    }

    /// Bytes currently held in memory.
    pub fn memory_bytes(&self) -> usize {
        self.memory().bytes()
    }
}

/// Sibling temp path, unique per write so concurrent writers never share it.
fn part_path(path: &Path) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("bin.{}.{seq}.part", std::process::id()))
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> AssetResult<()> {
    let io = |source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io)?;
    }
    let tmp = part_path(path);
    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(io(e));
    }
    tokio::fs::rename(&tmp, path).await.map_err(io)
}
