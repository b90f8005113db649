//! Packaging session, panel textures and geometry.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use packsmith_core::{
    BulkPanelRequest, DielineLayout, PackageMesh, PackagingState, PackagingStatus,
    PanelGenerateRequest, TextureLookup,
};
use tracing::info;

use crate::dto::{
    BulkAccepted, DimensionsUpdated, GeometryQuery, PanelAccepted, ShapeReset, TextureDeleted,
    TexturePending, UpdateDimensionsRequest,
};
use crate::error::HttpError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Texture one panel in the background.
pub async fn generate_panel(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PanelGenerateRequest>,
) -> Result<Json<PanelAccepted>, HttpError> {
    let job = state.core.panels().begin_panel(req).await?;
    let panel_id = job.panel_id.clone();

    let panels = state.core.panels().clone();
    tokio::spawn(async move {
        panels.run_panel(job).await;
    });
    Ok(Json(PanelAccepted::generating(panel_id)))
}

/// Texture several panels from one brief in the background.
pub async fn generate_all(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BulkPanelRequest>,
) -> Result<Json<BulkAccepted>, HttpError> {
    let job = state.core.panels().begin_bulk(req).await?;
    let panel_ids = job.panel_ids.clone();

    let panels = state.core.panels().clone();
    tokio::spawn(async move {
        let outcome = panels.run_bulk(job).await;
        info!(
            target: "packsmith.packaging",
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk generation finished"
        );
    });
    Ok(Json(BulkAccepted::generating(panel_ids)))
}

pub async fn get_state(State(state): State<AppState>) -> Result<Json<PackagingState>, HttpError> {
    Ok(Json(state.core.panels().state().await?))
}

pub async fn status(State(state): State<AppState>) -> Result<Json<PackagingStatus>, HttpError> {
    Ok(Json(state.core.panels().status().await?))
}

/// Texture of a panel, `202` while it is still being generated.
pub async fn get_texture(
    State(state): State<AppState>,
    Path(panel_id): Path<String>,
) -> Result<Response, HttpError> {
    match state.core.panels().panel_texture(&panel_id).await? {
        TextureLookup::Ready(texture) => Ok(Json(texture).into_response()),
        TextureLookup::Pending => {
            let body = TexturePending {
                status: "generating".to_string(),
                message: format!("Texture generation in progress for panel {panel_id}"),
                panel_id,
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
        TextureLookup::Missing => Err(HttpError::NotFound(format!(
            "No texture found for panel {panel_id}"
        ))),
    }
}

pub async fn delete_texture(
    State(state): State<AppState>,
    Path(panel_id): Path<String>,
) -> Result<Json<TextureDeleted>, HttpError> {
    state.core.panels().delete_texture(&panel_id).await?;
    Ok(Json(TextureDeleted {
        status: "deleted".to_string(),
        panel_id,
    }))
}

pub async fn update_dimensions(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateDimensionsRequest>,
) -> Result<Json<DimensionsUpdated>, HttpError> {
    state
        .core
        .panels()
        .update_dimensions(req.package_type, req.dimensions)
        .await?;
    Ok(Json(DimensionsUpdated {
        status: "updated".to_string(),
        package_type: req.package_type,
        dimensions: req.dimensions,
    }))
}

pub async fn reset_current_shape(
    State(state): State<AppState>,
) -> Result<Json<ShapeReset>, HttpError> {
    let (package_type, dimensions) = state.core.panels().reset_current_shape().await?;
    Ok(Json(ShapeReset {
        message: format!("Reset {package_type} to default state"),
        package_type,
        dimensions,
    }))
}

pub async fn clear(State(state): State<AppState>) -> Result<Json<PackagingState>, HttpError> {
    Ok(Json(state.core.panels().clear().await?))
}

/// Flat layout of the active shape.
pub async fn dieline(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GeometryQuery>,
) -> Result<Json<DielineLayout>, HttpError> {
    Ok(Json(state.core.panels().dieline(query.segments).await?))
}

/// Panel mesh of the active shape.
pub async fn mesh(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GeometryQuery>,
) -> Result<Json<PackageMesh>, HttpError> {
    Ok(Json(state.core.panels().mesh(query.segments).await?))
}
