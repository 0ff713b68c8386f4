use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/v1/availability",
            post(handlers::availability::query_availability),
        )
        .route("/v1/bookings", post(handlers::bookings::create_booking))
        .route(
            "/v1/bookings/:id",
            get(handlers::bookings::get_booking).patch(handlers::bookings::update_booking),
        )
        .route(
            "/v1/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
