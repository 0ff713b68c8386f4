use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use std::sync::Arc;

use super::respond;
use crate::models::{CreateBookingBody, UpdateBookingBody};
use crate::server::AppState;

/// Commit a booking after re-checking its slot
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingBody>,
) -> Response {
    respond(&state, StatusCode::CREATED, move |engine| {
        let zone = engine.resolve_business_time_zone(&body.business_id)?;
        let req = body.into_request(zone)?;
        engine.commit_booking(&req)
    })
    .await
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(&state, StatusCode::OK, move |engine| engine.get_booking(&id)).await
}

/// Change time, staff, status or notes of a booking
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateBookingBody>,
) -> Response {
    respond(&state, StatusCode::OK, move |engine| {
        let zone = engine.booking_time_zone(&id)?;
        let update = body.into_update(zone)?;
        engine.update_booking(&id, &update)
    })
    .await
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(&state, StatusCode::OK, move |engine| engine.cancel_booking(&id)).await
}
