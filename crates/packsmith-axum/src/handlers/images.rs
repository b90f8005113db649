use axum::Json;
use axum::extract::State;
use tracing::error;

use crate::dto::{ImageEditRequest, ImageEditResponse};
use crate::error::HttpError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Masked edit of one image.
pub async fn edit(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ImageEditRequest>,
) -> Result<Json<ImageEditResponse>, HttpError> {
    if req.prompt.trim().is_empty() {
        return Err(HttpError::BadRequest("prompt must not be empty".to_string()));
    }
    let edited = state
        .core
        .images()
        .edit_image(&req.original_image, &req.mask_image, &req.prompt)
        .await
        .inspect_err(|e| error!(target: "packsmith.images", error = %e, "Image editing failed"))?;

    edited
        .map(|edited_image| Json(ImageEditResponse { edited_image }))
        .ok_or_else(|| HttpError::BadGateway("Failed to generate edited image".to_string()))
}
