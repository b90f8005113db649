//! Route definitions and router construction.
//!
//! Axum 0.8 uses brace syntax for path parameters: `{panel_id}`.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

/// Largest accepted request body. Requests carry reference images and
/// masks as base64 data URLs, which routinely exceed axum's 2 MB default.
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        // Product pipeline
        .route("/product", get(handlers::product::get_state))
        .route("/product/status", get(handlers::product::status))
        .route("/product/create", post(handlers::product::create))
        .route("/product/edit", post(handlers::product::edit))
        // Packaging
        .route("/packaging/state", get(handlers::packaging::get_state))
        .route("/packaging/status", get(handlers::packaging::status))
        .route(
            "/packaging/panels/generate",
            post(handlers::packaging::generate_panel),
        )
        .route(
            "/packaging/panels/generate-all",
            post(handlers::packaging::generate_all),
        )
        .route(
            "/packaging/panels/{panel_id}/texture",
            get(handlers::packaging::get_texture).delete(handlers::packaging::delete_texture),
        )
        .route(
            "/packaging/update-dimensions",
            post(handlers::packaging::update_dimensions),
        )
        .route(
            "/packaging/reset-current-shape",
            post(handlers::packaging::reset_current_shape),
        )
        .route("/packaging/clear", post(handlers::packaging::clear))
        .route("/packaging/dieline", get(handlers::packaging::dieline))
        .route("/packaging/mesh", get(handlers::packaging::mesh))
        // One-off generation
        .route("/images/edit", post(handlers::images::edit))
        .route("/chat/generate", post(handlers::chat::generate))
        .route("/trellis/generate", post(handlers::trellis::generate))
        .route("/trellis/status", get(handlers::trellis::status))
        // Cached binaries
        .route(
            "/assets/models/{iteration_id}",
            get(handlers::assets::model),
        )
        .route(
            "/assets/images/{iteration_id}/{index}",
            get(handlers::assets::image),
        )
        .route(
            "/assets/textures/{panel_id}",
            get(handlers::assets::texture),
        )
}

/// Create the main Axum router with all routes, the body limit, CORS and
/// request tracing.
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);

    Router::new()
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        .merge(api_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(build_cors_layer(cors_config))
        .layer(TraceLayer::new_for_http())
}
