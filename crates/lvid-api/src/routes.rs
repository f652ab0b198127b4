//! API routes.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::health;
use crate::handlers::projects::{create_project, get_project, list_projects};
use crate::handlers::stages::{generate_audio, generate_avatar, generate_content, render};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let project_routes = Router::new()
        .route("/projects", post(create_project))
        .route("/projects", get(list_projects))
        .route("/projects/:project_id", get(get_project))
        // Stage triggers; completion is observed via GET /projects/:id
        .route("/projects/:project_id/generate-content", post(generate_content))
        .route("/projects/:project_id/generate-audio", post(generate_audio))
        .route("/projects/:project_id/generate-avatar", post(generate_avatar))
        .route("/projects/:project_id/render", post(render));

    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/health", get(health))
        .nest("/api", project_routes)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
