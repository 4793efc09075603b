use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Product operations through a chosen strategy
        .route("/products/{id}", get(handlers::get_product))
        .route("/products", post(handlers::upsert_product))
        // Metrics
        .route("/metrics", get(handlers::get_metrics))
        .route("/metrics/reset", post(handlers::reset_metrics))
        // Workload drivers
        .route("/simulate", post(handlers::simulate))
        .route("/compare", post(handlers::compare))
        // Middleware
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
