use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Masked edit of a single image. Images are data URLs or bare base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEditRequest {
    pub original_image: String,
    /// White marks the area to change.
    pub mask_image: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEditResponse {
    pub edited_image: String,
}

fn default_task() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatGenerateRequest {
    pub prompt: String,
    #[serde(default = "default_task")]
    pub task_type: String,
    #[serde(default)]
    pub response_schema: Option<Value>,
}
