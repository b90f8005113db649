//! Optional on-disk copies of generated assets for inspection.
//!
//! Each run writes into `<root>/<kind>_<mode>_<unix seconds>/`. Failures are
//! logged and never abort the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::data_url::DataUrl;
use crate::domain::{ProductState, TrellisArtifacts};
use crate::ports::BlobSource;

/// Writes generated images, downloaded Trellis files and state snapshots.
#[derive(Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
    source: Arc<dyn BlobSource>,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>, source: Arc<dyn BlobSource>) -> Self {
        Self {
            root: root.into(),
            source,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn run_dir(&self, kind: &str, mode: &str) -> Option<PathBuf> {
        let dir = self
            .root
            .join(format!("{kind}_{mode}_{}", Utc::now().timestamp()));
        match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => Some(dir),
            Err(e) => {
                warn!(
                    target: "packsmith.artifacts",
                    dir = %dir.display(),
                    error = %e,
                    "Failed to create artifacts dir"
                );
                None
            }
        }
    }

    /// Decode data-URL images into `gemini_<mode>_<ts>/gemini_view_<n>.<ext>`.
    ///
    /// Returns the number of files written.
    pub async fn save_images(&self, images: &[String], mode: &str) -> usize {
        let Some(dir) = self.run_dir("gemini", mode).await else {
            return 0;
        };
        let mut written = 0;
        for (idx, image) in images.iter().enumerate() {
            let Some(decoded) = DataUrl::parse(image) else {
                warn!(
                    target: "packsmith.artifacts",
                    index = idx + 1,
                    "Skipping image that is not a data URL"
                );
                continue;
            };
            let dest = dir.join(format!("gemini_view_{}.{}", idx + 1, decoded.extension()));
            match tokio::fs::write(&dest, &decoded.bytes).await {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(
                        target: "packsmith.artifacts",
                        dest = %dest.display(),
                        error = %e,
                        "Failed to save image"
                    );
                }
            }
        }
        info!(
            target: "packsmith.artifacts",
            dir = %dir.display(),
            written,
            "Saved generated images"
        );
        written
    }

    /// Download the model, videos and background-free renders of a run.
    ///
    /// Returns the run directory so the state snapshot can sit next to it.
    pub async fn save_trellis(&self, artifacts: &TrellisArtifacts, mode: &str) -> Option<PathBuf> {
        let Some(model_url) = artifacts.model_file.as_deref() else {
            warn!(target: "packsmith.artifacts", "No model_file to save");
            return None;
        };
        let dir = self.run_dir("trellis", mode).await?;

        self.download(model_url, &dir.join("model.glb")).await;
        let videos = [
            (&artifacts.color_video, "trellis_color.mp4"),
            (&artifacts.normal_video, "trellis_normal.mp4"),
            (&artifacts.combined_video, "trellis_combined.mp4"),
        ];
        for (url, name) in videos {
            if let Some(url) = url {
                self.download(url, &dir.join(name)).await;
            }
        }
        if !artifacts.no_background_images.is_empty() {
            let no_bg = dir.join("no_background");
            if tokio::fs::create_dir_all(&no_bg).await.is_ok() {
                for (idx, url) in artifacts.no_background_images.iter().enumerate() {
                    self.download(url, &no_bg.join(format!("no_bg_{}.png", idx + 1)))
                        .await;
                }
            }
        }
        Some(dir)
    }

    /// Write `state.json` into `dir`.
    pub async fn save_state(&self, dir: &Path, state: &ProductState) -> bool {
        let path = dir.join("state.json");
        let body = match serde_json::to_vec_pretty(state) {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    target: "packsmith.artifacts",
                    error = %e,
                    "Failed to serialise product state"
                );
                return false;
            }
        };
        match tokio::fs::write(&path, body).await {
            Ok(()) => {
                info!(target: "packsmith.artifacts", path = %path.display(), "Saved product state");
                true
            }
            Err(e) => {
                warn!(
                    target: "packsmith.artifacts",
                    path = %path.display(),
                    error = %e,
                    "Failed to save product state"
                );
                false
            }
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> bool {
        let bytes = match self.source.fetch(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    target: "packsmith.artifacts",
                    dest = %dest.display(),
                    error = %e,
                    "Download failed"
                );
                return false;
            }
        };
        match tokio::fs::write(dest, &bytes).await {
            Ok(()) => {
                info!(
                    target: "packsmith.artifacts",
                    dest = %dest.display(),
                    kb = bytes.len() / 1024,
                    "Saved artifact"
                );
                true
            }
            Err(e) => {
                warn!(
                    target: "packsmith.artifacts",
                    dest = %dest.display(),
                    error = %e,
                    "Write failed"
                );
                false
            }
        }
    }
}
