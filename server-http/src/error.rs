use crate::models::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Maps the engine's error taxonomy onto HTTP statuses: missing keys and
/// bad input are the caller's fault (4xx), a rejected durable write is a
/// bad gateway (5xx).
pub struct ApiError(pub shared::Error);

impl From<shared::Error> for ApiError {
    fn from(err: shared::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            shared::Error::NotFound => StatusCode::NOT_FOUND,
            shared::Error::InvalidStrategy(_) | shared::Error::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            shared::Error::StoreUnavailable(_) => StatusCode::BAD_GATEWAY,
            shared::Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}
