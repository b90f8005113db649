//! Binary assets served through the two-tier cache.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use packsmith_assets::{AssetKey, sniff_content_type};
use packsmith_core::TextureLookup;
use packsmith_core::services::iteration_artifacts;

use crate::error::HttpError;
use crate::state::AppState;

const GLB_CONTENT_TYPE: &str = "model/gltf-binary";

fn binary(content_type: &'static str, bytes: &[u8]) -> Response {
    (
        [(header::CONTENT_TYPE, content_type)],
        Bytes::copy_from_slice(bytes),
    )
        .into_response()
}

/// GLB of a product iteration.
pub async fn model(
    State(state): State<AppState>,
    Path(iteration_id): Path<String>,
) -> Result<Response, HttpError> {
    let product = state.core.product().state().await?;
    let url = iteration_artifacts(&product, &iteration_id)
        .and_then(|a| a.model_file.clone())
        .ok_or_else(|| HttpError::NotFound(format!("No model for iteration {iteration_id}")))?;

    let bytes = state
        .assets
        .get_or_fetch(&AssetKey::model(&iteration_id), &url)
        .await?;
    Ok(binary(GLB_CONTENT_TYPE, &bytes))
}

/// Concept image `index` (zero based) of a product iteration.
pub async fn image(
    State(state): State<AppState>,
    Path((iteration_id, index)): Path<(String, usize)>,
) -> Result<Response, HttpError> {
    let product = state.core.product().state().await?;
    let url = product
        .iteration(&iteration_id)
        .and_then(|it| it.images.get(index))
        .cloned()
        .ok_or_else(|| {
            HttpError::NotFound(format!("No image {index} for iteration {iteration_id}"))
        })?;

    let bytes = state
        .assets
        .get_or_fetch(&AssetKey::image(&iteration_id, index), &url)
        .await?;
    Ok(binary(sniff_content_type(&bytes), &bytes))
}

/// Texture image of a panel on the active shape.
///
/// The cache key includes the shape and generation time so a regenerated
/// texture never serves stale bytes.
pub async fn texture(
    State(state): State<AppState>,
    Path(panel_id): Path<String>,
) -> Result<Response, HttpError> {
    let texture = match state.core.panels().panel_texture(&panel_id).await? {
        TextureLookup::Ready(texture) => texture,
        TextureLookup::Pending => return Ok(StatusCode::ACCEPTED.into_response()),
        TextureLookup::Missing => {
            return Err(HttpError::NotFound(format!(
                "No texture found for panel {panel_id}"
            )));
        }
    };
    let package_type = state.core.panels().state().await?.current_package_type;
    let key = AssetKey::texture(format!(
        "{package_type}_{panel_id}_{}",
        texture.generated_at.timestamp_millis()
    ));

    let bytes = state.assets.get_or_fetch(&key, &texture.texture_url).await?;
    Ok(binary(sniff_content_type(&bytes), &bytes))
}
