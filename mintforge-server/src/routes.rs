use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::handlers;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/deployments", post(handlers::create_deployment))
        .route("/api/verifications", post(handlers::create_verification))
        .route("/api/jobs", get(handlers::list_jobs))
        .route("/api/jobs/{id}", get(handlers::get_job))
        .route("/api/jobs/{id}/wait", get(handlers::wait_job))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
