//! Image-to-3D generation port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GenerationError;
use crate::domain::TrellisArtifacts;

/// Sampling parameters for a Trellis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrellisParams {
    pub texture_size: u32,
    pub mesh_simplify: f64,
    pub ss_sampling_steps: u32,
    pub ss_guidance_strength: f64,
    pub slat_sampling_steps: u32,
    pub slat_guidance_strength: f64,
}

impl Default for TrellisParams {
    /// High-resolution settings used by the product pipeline.
    fn default() -> Self {
        Self {
            texture_size: 2048,
            mesh_simplify: 0.94,
            ss_sampling_steps: 16,
            ss_guidance_strength: 7.5,
            slat_sampling_steps: 16,
            slat_guidance_strength: 3.2,
        }
    }
}

/// How several input views are fused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiImageAlgo {
    #[default]
    Stochastic,
    Multidiffusion,
}

impl MultiImageAlgo {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stochastic => "stochastic",
            Self::Multidiffusion => "multidiffusion",
        }
    }
}

/// One image-to-3D job.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Data URLs or public URLs of the input views.
    pub images: Vec<String>,
    pub seed: u64,
    pub params: TrellisParams,
    pub use_multi_image: bool,
    pub multiimage_algo: MultiImageAlgo,
}

impl ModelRequest {
    /// Single-image request with default parameters.
    pub fn from_images(images: Vec<String>) -> Self {
        Self {
            images,
            seed: 1337,
            params: TrellisParams::default(),
            use_multi_image: false,
            multiimage_algo: MultiImageAlgo::default(),
        }
    }
}

/// Progress notification while a job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProgress {
    /// Upstream queue state, e.g. `IN_QUEUE`.
    pub stage: String,
    pub progress: u8,
    pub message: String,
}

/// Receives progress while a 3D job is polled.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, progress: ModelProgress);
}

/// Progress sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressSink for NoopProgress {
    async fn report(&self, _progress: ModelProgress) {}
}

/// Turns product views into a 3D asset.
#[async_trait]
pub trait ModelGenerator: Send + Sync {
    async fn generate_3d(
        &self,
        request: &ModelRequest,
        progress: &dyn ProgressSink,
    ) -> Result<TrellisArtifacts, GenerationError>;
}
