use crate::models::MessageResponse;
use axum::Json;

/// GET /health
pub async fn health_check() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "ok".to_string(),
    })
}
