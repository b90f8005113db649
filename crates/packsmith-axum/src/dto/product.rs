use serde::{Deserialize, Serialize};

const fn default_image_count() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreateRequest {
    pub prompt: String,
    #[serde(default = "default_image_count")]
    pub image_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductEditRequest {
    pub prompt: String,
}
