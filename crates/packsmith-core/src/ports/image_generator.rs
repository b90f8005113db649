//! Image generation port.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GenerationError;
use crate::domain::IterationKind;

/// Which generation policy applies.
///
/// `Create` renders from text with the high-quality model; `Edit` renders
/// against reference images with the fast model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageWorkflow {
    #[default]
    Create,
    Edit,
}

impl ImageWorkflow {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for ImageWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<IterationKind> for ImageWorkflow {
    fn from(kind: IterationKind) -> Self {
        match kind {
            IterationKind::Create => Self::Create,
            IterationKind::Edit => Self::Edit,
        }
    }
}

/// One image generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub workflow: ImageWorkflow,
    pub image_count: u32,
    /// Data URLs used as visual references. Only the first one is sent.
    pub reference_images: Vec<String>,
    /// Flat textures skip the product-photograph framing.
    pub is_texture: bool,
    /// Original product description, used to anchor edits.
    pub base_description: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>, workflow: ImageWorkflow) -> Self {
        Self {
            prompt: prompt.into(),
            workflow,
            image_count: 1,
            reference_images: Vec::new(),
            is_texture: false,
            base_description: None,
        }
    }

    #[must_use]
    pub const fn with_count(mut self, image_count: u32) -> Self {
        self.image_count = image_count;
        self
    }

    #[must_use]
    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.reference_images = references;
        self
    }

    #[must_use]
    pub const fn texture(mut self) -> Self {
        self.is_texture = true;
        self
    }

    #[must_use]
    pub fn with_base_description(mut self, description: Option<String>) -> Self {
        self.base_description = description;
        self
    }
}

/// Generates images as `data:` URLs.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate up to `image_count` images. Views that fail are skipped, so
    /// the result may be shorter than requested or empty.
    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<String>, GenerationError>;

    /// Apply `prompt` to the white area of `mask` on `original`.
    ///
    /// Returns `None` when the model answered without an image.
    async fn edit_image(
        &self,
        original: &str,
        mask: &str,
        prompt: &str,
    ) -> Result<Option<String>, GenerationError>;
}
