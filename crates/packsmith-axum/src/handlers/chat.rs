use axum::Json;
use axum::extract::State;
use packsmith_core::{ChatRequest, ChatTask};
use serde_json::Value;

use crate::dto::ChatGenerateRequest;
use crate::error::HttpError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Free text, or JSON matching `response_schema` when one is given.
pub async fn generate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ChatGenerateRequest>,
) -> Result<Json<Value>, HttpError> {
    let task: ChatTask = req.task_type.parse().map_err(HttpError::BadRequest)?;
    let request = ChatRequest {
        prompt: req.prompt,
        task,
        response_schema: req.response_schema,
    };
    Ok(Json(state.core.chat().generate(&request).await?))
}
