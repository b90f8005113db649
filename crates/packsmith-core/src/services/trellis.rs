//! Direct image-to-3D jobs with quality presets.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::session_store::SessionStore;
use crate::domain::TrellisArtifacts;
use crate::ports::state_repository::{TRELLIS_STATUS_KEY, TRELLIS_STATUS_TTL};
use crate::ports::{
    CoreError, ModelGenerator, ModelProgress, ModelRequest, MultiImageAlgo, ProgressSink,
    TrellisParams,
};

/// Named parameter sets for direct jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrellisQuality {
    #[default]
    Balanced,
    HighQuality,
}

impl TrellisQuality {
    pub const fn params(self) -> TrellisParams {
        match self {
            Self::Balanced => TrellisParams {
                texture_size: 1024,
                mesh_simplify: 0.92,
                ss_sampling_steps: 14,
                ss_guidance_strength: 7.5,
                slat_sampling_steps: 14,
                slat_guidance_strength: 3.5,
            },
            Self::HighQuality => TrellisParams {
                texture_size: 2048,
                mesh_simplify: 0.96,
                ss_sampling_steps: 26,
                ss_guidance_strength: 8.0,
                slat_sampling_steps: 26,
                slat_guidance_strength: 3.2,
            },
        }
    }
}

const fn default_seed() -> u64 {
    1337
}

/// Body of a direct 3D job. Explicit parameters override the preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrellisGenerateRequest {
    pub images: Vec<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub quality: TrellisQuality,
    #[serde(default)]
    pub texture_size: Option<u32>,
    #[serde(default)]
    pub mesh_simplify: Option<f64>,
    #[serde(default)]
    pub ss_sampling_steps: Option<u32>,
    #[serde(default)]
    pub ss_guidance_strength: Option<f64>,
    #[serde(default)]
    pub slat_sampling_steps: Option<u32>,
    #[serde(default)]
    pub slat_guidance_strength: Option<f64>,
    /// Defaults to true when more than one image is given.
    #[serde(default)]
    pub use_multi_image: Option<bool>,
    #[serde(default)]
    pub multiimage_algo: MultiImageAlgo,
}

impl TrellisGenerateRequest {
    pub fn new(images: Vec<String>) -> Self {
        Self {
            images,
            seed: default_seed(),
            quality: TrellisQuality::default(),
            texture_size: None,
            mesh_simplify: None,
            ss_sampling_steps: None,
            ss_guidance_strength: None,
            slat_sampling_steps: None,
            slat_guidance_strength: None,
            use_multi_image: None,
            multiimage_algo: MultiImageAlgo::default(),
        }
    }

    /// Resolve the preset and overrides into a generator request.
    pub fn to_model_request(&self) -> ModelRequest {
        let mut params = self.quality.params();
        if let Some(v) = self.texture_size {
            params.texture_size = v;
        }
        if let Some(v) = self.mesh_simplify {
            params.mesh_simplify = v;
        }
        if let Some(v) = self.ss_sampling_steps {
            params.ss_sampling_steps = v;
        }
        if let Some(v) = self.ss_guidance_strength {
            params.ss_guidance_strength = v;
        }
        if let Some(v) = self.slat_sampling_steps {
            params.slat_sampling_steps = v;
        }
        if let Some(v) = self.slat_guidance_strength {
            params.slat_guidance_strength = v;
        }
        ModelRequest {
            images: self.images.clone(),
            seed: self.seed,
            params,
            use_multi_image: self.use_multi_image.unwrap_or(self.images.len() > 1),
            multiimage_algo: self.multiimage_algo,
        }
    }
}

/// Last direct job, kept for an hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrellisJobStatus {
    pub status: String,
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_video: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub no_background_images: Vec<String>,
}

impl Default for TrellisJobStatus {
    fn default() -> Self {
        Self::new("idle", 0, "No generation started")
    }
}

impl TrellisJobStatus {
    fn new(status: &str, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            progress,
            message: message.into(),
            model_file: None,
            color_video: None,
            no_background_images: Vec::new(),
        }
    }
}

/// Runs direct jobs and records their status.
#[derive(Clone)]
pub struct TrellisService {
    store: SessionStore,
    models: Arc<dyn ModelGenerator>,
}

struct JobProgress<'a> {
    store: &'a SessionStore,
}

#[async_trait]
impl ProgressSink for JobProgress<'_> {
    async fn report(&self, progress: ModelProgress) {
        let status = TrellisJobStatus::new("processing", progress.progress, progress.message);
        let stored = self
            .store
            .put_document(TRELLIS_STATUS_KEY, &status, Some(TRELLIS_STATUS_TTL))
            .await;
        if let Err(e) = stored {
            warn!(target: "packsmith.trellis", error = %e, "Dropping Trellis progress update");
        }
    }
}

impl TrellisService {
    pub fn new(store: SessionStore, models: Arc<dyn ModelGenerator>) -> Self {
        Self { store, models }
    }

    pub async fn status(&self) -> Result<TrellisJobStatus, CoreError> {
        Ok(self.store.get_document(TRELLIS_STATUS_KEY).await?)
    }

    async fn record(&self, status: &TrellisJobStatus) -> Result<(), CoreError> {
        Ok(self
            .store
            .put_document(TRELLIS_STATUS_KEY, status, Some(TRELLIS_STATUS_TTL))
            .await?)
    }

    /// Run one job to completion.
    pub async fn generate(
        &self,
        request: &TrellisGenerateRequest,
    ) -> Result<TrellisArtifacts, CoreError> {
        if request.images.is_empty() {
            return Err(CoreError::Validation("At least one image is required".into()));
        }
        let model_request = request.to_model_request();
        info!(
            target: "packsmith.trellis",
            images = request.images.len(),
            quality = ?request.quality,
            multi = model_request.use_multi_image,
            "Starting direct 3D job"
        );
        self.record(&TrellisJobStatus::new("processing", 5, "Submitting job to Trellis…"))
            .await?;

        let sink = JobProgress { store: &self.store };
        match self.models.generate_3d(&model_request, &sink).await {
            Ok(artifacts) => {
                info!(target: "packsmith.trellis", "Successfully generated 3D asset");
                let done = TrellisJobStatus {
                    model_file: artifacts.model_file.clone(),
                    color_video: artifacts.color_video.clone(),
                    no_background_images: artifacts.no_background_images.clone(),
                    ..TrellisJobStatus::new("complete", 100, "3D model generated successfully!")
                };
                self.record(&done).await?;
                Ok(artifacts)
            }
            Err(e) => {
                error!(target: "packsmith.trellis", error = %e, "Error generating 3D asset");
                self.record(&TrellisJobStatus::new(
                    "error",
                    0,
                    format!("Generation failed: {e}"),
                ))
                .await?;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::GenerationError;
    use crate::services::session_store::tests::memory_store;
    use std::sync::Mutex;

    struct RecordingModels {
        fail: bool,
        seen: Mutex<Option<ModelRequest>>,
    }

    #[async_trait]
    impl ModelGenerator for RecordingModels {
        async fn generate_3d(
            &self,
            request: &ModelRequest,
            progress: &dyn ProgressSink,
        ) -> Result<TrellisArtifacts, GenerationError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            progress
                .report(ModelProgress {
                    stage: "IN_QUEUE".into(),
                    progress: 50,
                    message: "queued".into(),
                })
                .await;
            if self.fail {
                return Err(GenerationError::Timeout("600s".into()));
            }
            Ok(TrellisArtifacts {
                model_file: Some("https://fal.media/m.glb".into()),
                ..TrellisArtifacts::default()
            })
        }
    }

    fn models(fail: bool) -> Arc<RecordingModels> {
        Arc::new(RecordingModels {
            fail,
            seen: Mutex::new(None),
        })
    }

    #[test]
    fn overrides_win_over_preset() {
        let mut request: TrellisGenerateRequest = serde_json::from_value(serde_json::json!({
            "images": ["a", "b"],
            "quality": "high_quality",
            "texture_size": 512,
        }))
        .unwrap();
        let resolved = request.to_model_request();
        assert_eq!(resolved.params.texture_size, 512);
        assert_eq!(resolved.params.ss_sampling_steps, 26);
        assert!(resolved.use_multi_image);
        assert_eq!(resolved.seed, 1337);

        request.use_multi_image = Some(false);
        assert!(!request.to_model_request().use_multi_image);
        assert!(!TrellisGenerateRequest::new(vec!["a".into()]).to_model_request().use_multi_image);
    }

    #[tokio::test]
    async fn records_idle_then_complete() {
        let (repo, store) = memory_store();
        let fake = models(false);
        let svc = TrellisService::new(store, fake.clone());
        assert_eq!(svc.status().await.unwrap().message, "No generation started");

        let out = svc.generate(&TrellisGenerateRequest::new(vec!["a".into()])).await.unwrap();
        assert_eq!(out.model_file.as_deref(), Some("https://fal.media/m.glb"));
        let status = svc.status().await.unwrap();
        assert_eq!((status.status.as_str(), status.progress), ("complete", 100));
        assert_eq!(status.model_file, out.model_file);

        let docs = repo.docs.lock().unwrap();
        assert_eq!(docs[TRELLIS_STATUS_KEY].1, Some(TRELLIS_STATUS_TTL));
        assert_eq!(
            fake.seen.lock().unwrap().as_ref().unwrap().params,
            TrellisQuality::Balanced.params()
        );
    }

    #[tokio::test]
    async fn records_failure() {
        let (_, store) = memory_store();
        let svc = TrellisService::new(store, models(true));
        let err = svc
            .generate(&TrellisGenerateRequest::new(vec!["a".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Generation(GenerationError::Timeout(_))));
        let status = svc.status().await.unwrap();
        assert_eq!(status.status, "error");
        assert_eq!(status.message, "Generation failed: Timed out: 600s");
    }

    #[tokio::test]
    async fn lost_progress_write_does_not_abort_the_job() {
        use crate::services::session_store::tests::FlakyRepo;

        // write 0 is the submit status, write 1 the progress report
        let repo = Arc::new(FlakyRepo {
            fail_write: Some(1),
            ..FlakyRepo::default()
        });
        let svc = TrellisService::new(SessionStore::new(repo), models(false));
        let out = svc.generate(&TrellisGenerateRequest::new(vec!["a".into()])).await;
        assert!(out.is_ok());
        assert_eq!(svc.status().await.unwrap().status, "complete");
    }

    #[tokio::test]
    async fn rejects_empty_images() {
        let (_, store) = memory_store();
        let svc = TrellisService::new(store, models(false));
        assert!(svc.generate(&TrellisGenerateRequest::new(vec![])).await.is_err());
    }
}
