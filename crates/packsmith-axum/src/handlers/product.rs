//! Product create/edit pipeline.

use axum::Json;
use axum::extract::State;
use packsmith_core::{ProductState, ProductStatus};

use crate::dto::{ProductCreateRequest, ProductEditRequest};
use crate::error::HttpError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Start a new product and run the pipeline in the background.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProductCreateRequest>,
) -> Result<Json<ProductStatus>, HttpError> {
    let payload = state
        .core
        .product()
        .start_create(&req.prompt, req.image_count)
        .await?;

    let pipeline = state.core.product().clone();
    tokio::spawn(async move {
        pipeline.run_create(req.prompt, req.image_count).await;
    });
    Ok(Json(payload))
}

/// Edit the current product in the background.
pub async fn edit(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProductEditRequest>,
) -> Result<Json<ProductStatus>, HttpError> {
    let payload = state.core.product().start_edit(&req.prompt).await?;

    let pipeline = state.core.product().clone();
    tokio::spawn(async move {
        pipeline.run_edit(req.prompt).await;
    });
    Ok(Json(payload))
}

pub async fn get_state(State(state): State<AppState>) -> Result<Json<ProductState>, HttpError> {
    Ok(Json(state.core.product().state().await?))
}

pub async fn status(State(state): State<AppState>) -> Result<Json<ProductStatus>, HttpError> {
    Ok(Json(state.core.product().status().await?))
}
