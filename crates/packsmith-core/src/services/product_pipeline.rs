//! Create/edit pipeline for the single product session.
//!
//! `start_*` validates and records a pending run, then the caller spawns
//! `run_*` in the background. A run moves through
//! `generating_images` (10) → `generating_model` (45..95) → `complete` (100),
//! or `error` on any failure.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use super::artifacts::ArtifactWriter;
use super::session_store::SessionStore;
use crate::domain::product::{
    STATUS_COMPLETE, STATUS_ERROR, STATUS_GENERATING_IMAGES, STATUS_GENERATING_MODEL,
    STATUS_PENDING,
};
use crate::domain::{
    IterationKind, ProductIteration, ProductMode, ProductState, ProductStatus, TrellisArtifacts,
};
use crate::ports::{
    CoreError, ImageGenerator, ImageRequest, ModelGenerator, ModelProgress, ModelRequest,
    ProgressSink,
};

pub const CREATE_PROMPT_MIN: usize = 5;
pub const EDIT_PROMPT_MIN: usize = 3;
pub const PROMPT_MAX: usize = 2000;
pub const MAX_IMAGE_COUNT: u32 = 6;

const MODEL_PROGRESS_FLOOR: u8 = 45;
const MODEL_PROGRESS_CEIL: u8 = 95;

fn check_prompt(prompt: &str, min: usize) -> Result<(), CoreError> {
    let len = prompt.chars().count();
    if len < min || len > PROMPT_MAX {
        return Err(CoreError::Validation(format!(
            "prompt must be between {min} and {PROMPT_MAX} characters"
        )));
    }
    Ok(())
}

/// Orchestrates image generation, 3D generation and session bookkeeping.
#[derive(Clone)]
pub struct ProductPipeline {
    store: SessionStore,
    images: Arc<dyn ImageGenerator>,
    models: Arc<dyn ModelGenerator>,
    artifacts: Option<ArtifactWriter>,
}

impl ProductPipeline {
    pub fn new(
        store: SessionStore,
        images: Arc<dyn ImageGenerator>,
        models: Arc<dyn ModelGenerator>,
    ) -> Self {
        Self {
            store,
            images,
            models,
            artifacts: None,
        }
    }

    /// Also write every run's outputs to disk.
    #[must_use]
    pub fn with_artifacts(mut self, writer: ArtifactWriter) -> Self {
        self.artifacts = Some(writer);
        self
    }

    pub async fn state(&self) -> Result<ProductState, CoreError> {
        Ok(self.store.product().await?)
    }

    pub async fn status(&self) -> Result<ProductStatus, CoreError> {
        Ok(self.store.product_status().await?)
    }

    /// Reset the session for a new product and record a pending status.
    pub async fn start_create(
        &self,
        prompt: &str,
        image_count: u32,
    ) -> Result<ProductStatus, CoreError> {
        check_prompt(prompt, CREATE_PROMPT_MIN)?;
        if !(1..=MAX_IMAGE_COUNT).contains(&image_count) {
            return Err(CoreError::Validation(format!(
                "image_count must be between 1 and {MAX_IMAGE_COUNT}"
            )));
        }

        let (accepted, _) = self
            .store
            .update_product(|state| {
                if state.in_progress {
                    return false;
                }
                state.prompt = Some(prompt.to_string());
                state.latest_instruction = Some(prompt.to_string());
                state.mode = ProductMode::Create;
                state.status = STATUS_PENDING.to_string();
                state.message = Some("Preparing product generation".to_string());
                state.in_progress = true;
                state.generation_started_at = Some(Utc::now());
                state.image_count = image_count;
                state.images.clear();
                state.trellis_output = None;
                state.iterations.clear();
                state.last_error = None;
                true
            })
            .await?;
        if !accepted {
            return Err(CoreError::Conflict("Generation already running".to_string()));
        }

        let payload = ProductStatus::stage(STATUS_PENDING, 0, "Preparing product generation");
        self.store.replace_product_status(&payload).await?;
        info!(target: "packsmith.pipeline", image_count, "Queued create request");
        Ok(payload)
    }

    /// Record a pending edit of the existing product.
    pub async fn start_edit(&self, prompt: &str) -> Result<ProductStatus, CoreError> {
        check_prompt(prompt, EDIT_PROMPT_MIN)?;

        let (outcome, _) = self
            .store
            .update_product(|state| {
                if state.in_progress {
                    return Err(CoreError::Conflict("Generation already running".to_string()));
                }
                if !state.has_base_product() {
                    return Err(CoreError::Validation(
                        "No base product available to edit".to_string(),
                    ));
                }
                state.latest_instruction = Some(prompt.to_string());
                state.mode = ProductMode::Edit;
                state.status = STATUS_PENDING.to_string();
                state.message = Some("Preparing edit request".to_string());
                state.in_progress = true;
                state.generation_started_at = Some(Utc::now());
                Ok(())
            })
            .await?;
        outcome?;

        let payload = ProductStatus::stage(STATUS_PENDING, 0, "Preparing edit request");
        self.store.replace_product_status(&payload).await?;
        info!(target: "packsmith.pipeline", "Queued edit request");
        Ok(payload)
    }

    /// Run the create flow to completion. Failures are recorded, not returned.
    pub async fn run_create(&self, prompt: String, image_count: u32) {
        info!(target: "packsmith.pipeline", "Starting create flow");
        let prepared = self
            .store
            .update_product(|state| {
                state.prompt = Some(prompt.clone());
                state.mode = ProductMode::Create;
                state.image_count = image_count;
            })
            .await;
        if let Err(e) = prepared {
            self.fail(&CoreError::from(e)).await;
            return;
        }
        self.execute(IterationKind::Create, prompt).await;
    }

    /// Run the edit flow to completion. Failures are recorded, not returned.
    pub async fn run_edit(&self, instruction: String) {
        info!(target: "packsmith.pipeline", "Starting edit flow");
        let prepared = self
            .store
            .update_product(|state| {
                if state.prompt.as_deref().is_none_or(str::is_empty) {
                    return Err(CoreError::Validation(
                        "Cannot edit before creating an initial product".to_string(),
                    ));
                }
                state.mode = ProductMode::Edit;
                state.latest_instruction = Some(instruction.clone());
                Ok(())
            })
            .await;
        match prepared {
            Ok((Ok(()), _)) => self.execute(IterationKind::Edit, instruction).await,
            Ok((Err(e), _)) => self.fail(&e).await,
            Err(e) => self.fail(&CoreError::from(e)).await,
        }
    }

    async fn execute(&self, kind: IterationKind, instruction: String) {
        let started = Instant::now();
        if let Err(e) = self.execute_inner(kind, &instruction, started).await {
            error!(
                target: "packsmith.pipeline",
                mode = %kind,
                error = %e,
                "Product pipeline failed"
            );
            self.fail(&e).await;
        }
    }

    async fn execute_inner(
        &self,
        kind: IterationKind,
        instruction: &str,
        started: Instant,
    ) -> Result<(), CoreError> {
        let (_, state) = self
            .store
            .update_product(|state| {
                state.in_progress = true;
                state.mark_progress(STATUS_GENERATING_IMAGES, Some("Generating concept images"));
            })
            .await?;
        self.store
            .merge_product_status(ProductStatus::stage(
                STATUS_GENERATING_IMAGES,
                10,
                "Generating concept images",
            ))
            .await?;

        let references = match kind {
            IterationKind::Edit => state.images.clone(),
            IterationKind::Create => Vec::new(),
        };
        let request = ImageRequest::new(instruction, kind.into())
            .with_count(state.image_count.max(1))
            .with_references(references)
            .with_base_description(state.prompt.clone());
        let images = self.images.generate_images(&request).await?;
        if images.is_empty() {
            return Err(CoreError::Internal(
                "Gemini image pipeline returned no images".to_string(),
            ));
        }
        info!(target: "packsmith.pipeline", count = images.len(), "Concept images ready");

        let stored_images = images.clone();
        self.store
            .update_product(move |state| {
                state.images = stored_images;
                state.mark_progress(
                    STATUS_GENERATING_MODEL,
                    Some("Generating 3D model with Trellis"),
                );
            })
            .await?;
        if let Some(writer) = &self.artifacts {
            writer.save_images(&images, kind.as_str()).await;
        }
        self.store
            .merge_product_status(ProductStatus::stage(
                STATUS_GENERATING_MODEL,
                MODEL_PROGRESS_FLOOR,
                "Generating 3D model with Trellis",
            ))
            .await?;

        let sink = StatusProgress {
            store: self.store.clone(),
        };
        let artifacts = self
            .models
            .generate_3d(&ModelRequest::from_images(images.clone()), &sink)
            .await?;

        let now = Utc::now();
        let iteration = ProductIteration {
            id: ProductIteration::id_at(now),
            kind,
            prompt: instruction.to_string(),
            images,
            trellis_output: Some(artifacts.clone()),
            created_at: now,
            note: None,
            duration_seconds: Some((started.elapsed().as_secs_f64() * 100.0).round() / 100.0),
        };
        let stored_artifacts = artifacts.clone();
        let (_, state) = self
            .store
            .update_product(move |state| {
                state.trellis_output = Some(stored_artifacts);
                state.iterations.push(iteration);
                state.mark_complete("3D asset generated");
            })
            .await?;

        if let Some(writer) = &self.artifacts {
            if let Some(dir) = writer.save_trellis(&artifacts, kind.as_str()).await {
                writer.save_state(&dir, &state).await;
            }
        }

        let mut done = ProductStatus::stage(STATUS_COMPLETE, 100, "3D asset generated");
        done.model_file.clone_from(&artifacts.model_file);
        done.preview_image = state.preview_image();
        self.store.merge_product_status(done).await?;
        info!(
            target: "packsmith.pipeline",
            mode = %kind,
            iterations = state.iterations.len(),
            "Flow complete"
        );
        Ok(())
    }

    async fn fail(&self, err: &CoreError) {
        let message = err.to_string();
        if let Err(e) = self
            .store
            .update_product(|state| state.mark_error(message.clone()))
            .await
        {
            warn!(
                target: "packsmith.pipeline",
                error = %e,
                "Could not record pipeline failure in state"
            );
        }
        let payload = ProductStatus {
            error: Some(message),
            ..ProductStatus::stage(STATUS_ERROR, 0, "Pipeline failed")
        };
        if let Err(e) = self.store.merge_product_status(payload).await {
            warn!(
                target: "packsmith.pipeline",
                error = %e,
                "Could not record pipeline failure in status"
            );
        }
    }
}

/// Forwards Trellis progress into the product status, kept inside 45..95.
struct StatusProgress {
    store: SessionStore,
}

#[async_trait]
impl ProgressSink for StatusProgress {
    async fn report(&self, progress: ModelProgress) {
        let pct = progress
            .progress
            .clamp(MODEL_PROGRESS_FLOOR, MODEL_PROGRESS_CEIL);
        let update = ProductStatus::stage(STATUS_GENERATING_MODEL, pct, progress.message);
        if let Err(e) = self.store.merge_product_status(update).await {
            warn!(target: "packsmith.pipeline", error = %e, "Dropping Trellis progress update");
        }
    }
}

/// Latest artifacts of an iteration, for asset lookups.
pub fn iteration_artifacts<'a>(
    state: &'a ProductState,
    iteration_id: &str,
) -> Option<&'a TrellisArtifacts> {
    state.iteration(iteration_id)?.trellis_output.as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{GenerationError, NoopProgress};
    use crate::services::session_store::tests::memory_store;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeImages {
        fail: bool,
        calls: Mutex<Vec<ImageRequest>>,
    }

    #[async_trait]
    impl ImageGenerator for FakeImages {
        async fn generate_images(
            &self,
            request: &ImageRequest,
        ) -> Result<Vec<String>, GenerationError> {
            self.calls.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(GenerationError::QuotaExceeded("daily limit".into()));
            }
            Ok((0..request.image_count)
                .map(|i| format!("data:image/png;base64,{}{i}", request.workflow))
                .collect())
        }

        async fn edit_image(
            &self,
            _original: &str,
            _mask: &str,
            _prompt: &str,
        ) -> Result<Option<String>, GenerationError> {
            Ok(None)
        }
    }

    struct FakeModels;

    #[async_trait]
    impl ModelGenerator for FakeModels {
        async fn generate_3d(
            &self,
            request: &ModelRequest,
            progress: &dyn ProgressSink,
        ) -> Result<TrellisArtifacts, GenerationError> {
            progress
                .report(ModelProgress {
                    stage: "IN_QUEUE".into(),
                    progress: 50,
                    message: "Queued".into(),
                })
                .await;
            Ok(TrellisArtifacts {
                model_file: Some(format!("https://fal.media/{}.glb", request.images.len())),
                ..TrellisArtifacts::default()
            })
        }
    }

    fn pipeline(images: Arc<FakeImages>) -> ProductPipeline {
        let (_, store) = memory_store();
        ProductPipeline::new(store, images, Arc::new(FakeModels))
    }

    #[tokio::test]
    async fn create_flow_completes_with_iteration() {
        let images = Arc::new(FakeImages::default());
        let pipeline = pipeline(images.clone());

        let pending = pipeline.start_create("A glass perfume bottle", 2).await.unwrap();
        assert_eq!(pending.status, STATUS_PENDING);
        pipeline
            .run_create("A glass perfume bottle".into(), 2)
            .await;

        let state = pipeline.state().await.unwrap();
        assert_eq!(state.status, STATUS_COMPLETE);
        assert!(!state.in_progress);
        assert_eq!(state.images.len(), 2);
        assert_eq!(state.iterations.len(), 1);
        assert!(state.iterations[0].id.starts_with("iter_"));
        assert!(state.iterations[0].duration_seconds.is_some());

        let status = pipeline.status().await.unwrap();
        assert_eq!(status.progress, 100);
        assert_eq!(status.model_file.as_deref(), Some("https://fal.media/2.glb"));
        assert_eq!(status.preview_image.as_deref(), Some(state.images[0].as_str()));
        assert!(images.calls.lock().unwrap()[0].reference_images.is_empty());
    }

    #[tokio::test]
    async fn edit_uses_previous_images_as_references() {
        let images = Arc::new(FakeImages::default());
        let pipeline = pipeline(images.clone());
        pipeline.start_create("A ceramic mug", 1).await.unwrap();
        pipeline.run_create("A ceramic mug".into(), 1).await;
        let before = pipeline.state().await.unwrap().images;

        pipeline.start_edit("make it matte black").await.unwrap();
        pipeline.run_edit("make it matte black".into()).await;

        let calls = images.calls.lock().unwrap();
        let edit = calls.last().unwrap();
        assert_eq!(edit.workflow, crate::ports::ImageWorkflow::Edit);
        assert_eq!(edit.reference_images, before);
        assert_eq!(edit.base_description.as_deref(), Some("A ceramic mug"));
        drop(calls);

        let state = pipeline.state().await.unwrap();
        assert_eq!(state.iterations.len(), 2);
        assert_eq!(state.iterations[1].kind, IterationKind::Edit);
        assert_eq!(state.prompt.as_deref(), Some("A ceramic mug"));
    }

    #[tokio::test]
    async fn busy_session_rejects_new_runs() {
        let pipeline = pipeline(Arc::new(FakeImages::default()));
        pipeline.start_create("A tall candle jar", 3).await.unwrap();
        let err = pipeline.start_create("Another product", 3).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(matches!(
            pipeline.start_edit("tweak").await.unwrap_err(),
            CoreError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn edit_requires_base_product() {
        let pipeline = pipeline(Arc::new(FakeImages::default()));
        let err = pipeline.start_edit("make it red").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn validates_prompt_and_count() {
        let pipeline = pipeline(Arc::new(FakeImages::default()));
        assert!(pipeline.start_create("mug", 3).await.is_err());
        assert!(pipeline.start_create("A ceramic mug", 0).await.is_err());
        assert!(pipeline.start_create("A ceramic mug", 7).await.is_err());
    }

    #[tokio::test]
    async fn generator_failure_is_recorded() {
        let pipeline = pipeline(Arc::new(FakeImages {
            fail: true,
            ..FakeImages::default()
        }));
        pipeline.start_create("A ceramic mug", 1).await.unwrap();
        pipeline.run_create("A ceramic mug".into(), 1).await;

        let state = pipeline.state().await.unwrap();
        assert_eq!(state.status, STATUS_ERROR);
        assert!(!state.in_progress);
        assert_eq!(state.last_error.as_deref(), Some("Quota exceeded: daily limit"));

        let status = pipeline.status().await.unwrap();
        assert_eq!(status.status, STATUS_ERROR);
        assert_eq!(status.progress, 0);
        assert_eq!(status.message.as_deref(), Some("Pipeline failed"));
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn progress_is_clamped_into_model_band() {
        let (_, store) = memory_store();
        let sink = StatusProgress {
            store: store.clone(),
        };
        sink.report(ModelProgress {
            stage: "IN_PROGRESS".into(),
            progress: 99,
            message: "Sampling".into(),
        })
        .await;
        assert_eq!(store.product_status().await.unwrap().progress, 95);
        NoopProgress
            .report(ModelProgress {
                stage: "x".into(),
                progress: 1,
                message: String::new(),
            })
            .await;
    }
}
