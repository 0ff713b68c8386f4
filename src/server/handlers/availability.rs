use axum::{extract::State, http::StatusCode, response::Response, Json};
use std::sync::Arc;

use super::respond;
use crate::models::{AvailabilityQuery, AvailabilityResponse};
use crate::server::AppState;

/// Query bookable slots for a service.
///
/// Timestamps without an offset are read in the business's zone.
pub async fn query_availability(
    State(state): State<Arc<AppState>>,
    Json(query): Json<AvailabilityQuery>,
) -> Response {
    respond(&state, StatusCode::OK, move |engine| {
        let zone = engine.resolve_business_time_zone(&query.business_id)?;
        let req = query.into_request(zone, engine.settings().default_interval_minutes)?;
        let slots = engine.resolve_availability(&req)?;
        Ok(AvailabilityResponse { slots })
    })
    .await
}
