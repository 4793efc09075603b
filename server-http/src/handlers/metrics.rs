use crate::models::{MessageResponse, MetricsResponse};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use tracing::info;

/// GET /metrics
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        strategies: state.registry.snapshot_all(),
    })
}

/// POST /metrics/reset
pub async fn reset_metrics(State(state): State<AppState>) -> Json<MessageResponse> {
    info!("resetting metrics");
    state.registry.metrics().reset_all();
    Json(MessageResponse {
        message: "Metrics reset successfully".to_string(),
    })
}
