//! Product generation session types.
//!
//! A single product session is persisted as one JSON document. The
//! lightweight [`ProductStatus`] lives in its own document so clients can
//! poll it cheaply while the pipeline runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status string used before any generation has started.
pub const STATUS_IDLE: &str = "idle";
/// Status string for a queued run that has not begun generating.
pub const STATUS_PENDING: &str = "pending";
/// Status string while concept images are generated.
pub const STATUS_GENERATING_IMAGES: &str = "generating_images";
/// Status string while the 3D model is generated.
pub const STATUS_GENERATING_MODEL: &str = "generating_model";
/// Terminal success status.
pub const STATUS_COMPLETE: &str = "complete";
/// Terminal failure status.
pub const STATUS_ERROR: &str = "error";

/// Default number of concept images per run.
pub const DEFAULT_IMAGE_COUNT: u32 = 3;

/// Latest Trellis asset bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrellisArtifacts {
    pub model_file: Option<String>,
    pub color_video: Option<String>,
    pub gaussian_ply: Option<String>,
    pub normal_video: Option<String>,
    pub combined_video: Option<String>,
    pub no_background_images: Vec<String>,
}

/// Kind of pass that produced an iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationKind {
    #[default]
    Create,
    Edit,
}

impl IterationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
        }
    }
}

impl std::fmt::Display for IterationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Historical record for each create/edit pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductIteration {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: IterationKind,
    pub prompt: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub trellis_output: Option<TrellisArtifacts>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

impl ProductIteration {
    /// Build an iteration id from a wall-clock timestamp (`iter_<millis>`).
    pub fn id_at(at: DateTime<Utc>) -> String {
        format!("iter_{}", at.timestamp_millis())
    }
}

/// What the session is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductMode {
    #[default]
    Idle,
    Create,
    Edit,
}

impl From<IterationKind> for ProductMode {
    fn from(kind: IterationKind) -> Self {
        match kind {
            IterationKind::Create => Self::Create,
            IterationKind::Edit => Self::Edit,
        }
    }
}

/// Single-session source of truth for product generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductState {
    pub prompt: Option<String>,
    pub latest_instruction: Option<String>,
    pub mode: ProductMode,
    pub status: String,
    pub message: Option<String>,
    pub in_progress: bool,
    /// Kept so a reloaded client can continue its elapsed-time display.
    pub generation_started_at: Option<DateTime<Utc>>,
    pub image_count: u32,
    pub images: Vec<String>,
    pub trellis_output: Option<TrellisArtifacts>,
    pub iterations: Vec<ProductIteration>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ProductState {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            prompt: None,
            latest_instruction: None,
            mode: ProductMode::Idle,
            status: STATUS_IDLE.to_string(),
            message: None,
            in_progress: false,
            generation_started_at: None,
            image_count: DEFAULT_IMAGE_COUNT,
            images: Vec::new(),
            trellis_output: None,
            iterations: Vec::new(),
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl ProductState {
    /// Record a pipeline failure.
    pub fn mark_error(&mut self, error_message: impl Into<String>) {
        let message = error_message.into();
        self.status = STATUS_ERROR.to_string();
        self.message = Some(message.clone());
        self.last_error = Some(message);
        self.in_progress = false;
        self.updated_at = Utc::now();
    }

    /// Record a successful run and stop the client timer.
    pub fn mark_complete(&mut self, message: impl Into<String>) {
        self.status = STATUS_COMPLETE.to_string();
        self.message = Some(message.into());
        self.in_progress = false;
        self.generation_started_at = None;
        self.updated_at = Utc::now();
    }

    /// Move to a new pipeline stage. The message is only replaced when given.
    pub fn mark_progress(&mut self, status: &str, message: Option<&str>) {
        self.status = status.to_string();
        if let Some(message) = message {
            self.message = Some(message.to_string());
        }
        self.updated_at = Utc::now();
    }

    /// Whether an edit has something to build on.
    pub fn has_base_product(&self) -> bool {
        self.prompt.as_deref().is_some_and(|p| !p.is_empty()) && !self.images.is_empty()
    }

    /// Look up an iteration by id.
    pub fn iteration(&self, id: &str) -> Option<&ProductIteration> {
        self.iterations.iter().find(|it| it.id == id)
    }

    /// Preview for the status payload: first background-free render, else the
    /// first concept image.
    pub fn preview_image(&self) -> Option<String> {
        self.trellis_output
            .as_ref()
            .and_then(|out| out.no_background_images.first().cloned())
            .or_else(|| self.images.first().cloned())
    }
}

/// Lightweight payload that clients poll frequently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductStatus {
    pub status: String,
    pub progress: u8,
    pub message: Option<String>,
    pub error: Option<String>,
    pub model_file: Option<String>,
    pub preview_image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ProductStatus {
    fn default() -> Self {
        Self {
            status: STATUS_IDLE.to_string(),
            progress: 0,
            message: None,
            error: None,
            model_file: None,
            preview_image: None,
            updated_at: Utc::now(),
        }
    }
}

impl ProductStatus {
    /// A status update with only a stage, progress and message.
    pub fn stage(status: &str, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            progress: progress.min(100),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether the run has reached `complete` or `error`.
    pub fn is_terminal(&self) -> bool {
        self.status == STATUS_COMPLETE || self.status == STATUS_ERROR
    }

    /// Apply an update on top of the stored payload.
    ///
    /// Everything is replaced except `model_file` and `preview_image`, which
    /// survive updates that do not carry a value.
    pub fn merge(&mut self, update: Self) {
        self.status = update.status;
        self.progress = update.progress;
        self.message = update.message;
        self.error = update.error;
        if update.model_file.is_some() {
            self.model_file = update.model_file;
        }
        if update.preview_image.is_some() {
            self.preview_image = update.preview_image;
        }
        self.updated_at = update.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        let state = ProductState::default();
        assert_eq!(state.status, STATUS_IDLE);
        assert_eq!(state.mode, ProductMode::Idle);
        assert_eq!(state.image_count, DEFAULT_IMAGE_COUNT);
        assert!(!state.has_base_product());
    }

    #[test]
    fn mark_complete_clears_timer() {
        let mut state = ProductState {
            in_progress: true,
            generation_started_at: Some(Utc::now()),
            ..ProductState::default()
        };
        state.mark_complete("3D asset generated");
        assert_eq!(state.status, STATUS_COMPLETE);
        assert!(!state.in_progress);
        assert!(state.generation_started_at.is_none());
    }

    #[test]
    fn mark_progress_keeps_message_when_none() {
        let mut state = ProductState::default();
        state.mark_progress(STATUS_GENERATING_IMAGES, Some("Generating concept images"));
        state.mark_progress(STATUS_GENERATING_MODEL, None);
        assert_eq!(state.status, STATUS_GENERATING_MODEL);
        assert_eq!(state.message.as_deref(), Some("Generating concept images"));
    }

    #[test]
    fn status_merge_keeps_model_file() {
        let mut stored = ProductStatus {
            model_file: Some("https://cdn.local/a.glb".into()),
            preview_image: Some("preview".into()),
            ..ProductStatus::default()
        };
        stored.merge(ProductStatus::stage(STATUS_GENERATING_IMAGES, 10, "again"));
        assert_eq!(stored.status, STATUS_GENERATING_IMAGES);
        assert_eq!(stored.model_file.as_deref(), Some("https://cdn.local/a.glb"));
        assert_eq!(stored.preview_image.as_deref(), Some("preview"));
    }

    #[test]
    fn preview_prefers_background_free_render() {
        let mut state = ProductState {
            images: vec!["concept".into()],
            ..ProductState::default()
        };
        assert_eq!(state.preview_image().as_deref(), Some("concept"));

        state.trellis_output = Some(TrellisArtifacts {
            no_background_images: vec!["nobg".into()],
            ..TrellisArtifacts::default()
        });
        assert_eq!(state.preview_image().as_deref(), Some("nobg"));
    }

    #[test]
    fn iteration_serializes_kind_as_type() {
        let iteration = ProductIteration {
            id: "iter_1".into(),
            kind: IterationKind::Edit,
            prompt: "Add metallic label".into(),
            images: vec![],
            trellis_output: None,
            created_at: Utc::now(),
            note: None,
            duration_seconds: Some(1.5),
        };
        let json = serde_json::to_value(&iteration).unwrap();
        assert_eq!(json["type"], "edit");
    }

    #[test]
    fn state_deserializes_from_partial_document() {
        let state: ProductState =
            serde_json::from_value(serde_json::json!({"prompt": "Base bottle"})).unwrap();
        assert_eq!(state.prompt.as_deref(), Some("Base bottle"));
        assert_eq!(state.status, STATUS_IDLE);
    }
}
