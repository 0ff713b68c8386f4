pub mod availability;
pub mod bookings;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::engine::BookingEngine;
use crate::error::{BookingError, Result};
use crate::server::AppState;

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Standard error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: code.into(),
        }
    }
}

fn status_for(err: &BookingError) -> StatusCode {
    match err {
        BookingError::InvalidTimeFormat(_) | BookingError::InvalidRequest(_) => {
            StatusCode::BAD_REQUEST
        }
        BookingError::EntityNotFound { .. } => StatusCode::NOT_FOUND,
        BookingError::StaffCannotProvideService { .. }
        | BookingError::InsufficientCapacity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BookingError::SlotNoLongerAvailable { .. } => StatusCode::CONFLICT,
        BookingError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::warn!(error = %self, retryable = self.is_retryable(), "request failed");
        }
        (status, Json(ErrorResponse::new(self.to_string(), self.code()))).into_response()
    }
}

/// Run engine work on the blocking pool and render the outcome
pub(crate) async fn respond<T, F>(state: &AppState, status: StatusCode, f: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&BookingEngine) -> Result<T> + Send + 'static,
{
    let engine = state.engine.clone();
    match tokio::task::spawn_blocking(move || f(&engine)).await {
        Ok(Ok(value)) => (status, Json(value)).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            tracing::error!("engine task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal error", "internal")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&BookingError::InvalidTimeFormat("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&BookingError::not_found(crate::error::EntityKind::Staff, "s")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&BookingError::InsufficientCapacity {
                resource_type_id: "room".to_string(),
                requested: 3,
                capacity: 2
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&BookingError::SlotNoLongerAvailable { start: Utc::now() }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&BookingError::StoreUnavailable("busy".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
