//! Direct image-to-3D jobs.

use axum::Json;
use axum::extract::State;
use packsmith_core::{TrellisArtifacts, TrellisGenerateRequest, TrellisJobStatus};

use crate::error::HttpError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Runs the job inline; the response arrives when the model is ready.
pub async fn generate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TrellisGenerateRequest>,
) -> Result<Json<TrellisArtifacts>, HttpError> {
    Ok(Json(state.core.trellis().generate(&req).await?))
}

pub async fn status(State(state): State<AppState>) -> Result<Json<TrellisJobStatus>, HttpError> {
    Ok(Json(state.core.trellis().status().await?))
}
