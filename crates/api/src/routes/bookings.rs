//! Route definitions for the `/bookings` resource. Every route requires a
//! session.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bookings;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/{code}", get(bookings::get_booking))
        .route("/{code}/history", get(bookings::get_history))
        .route("/{code}/validation", post(bookings::validate_booking))
        .route("/{code}/start", post(bookings::start_trip))
        .route("/{code}/pickup", post(bookings::mark_pickup))
        .route("/{code}/complete", post(bookings::complete_trip))
        .route("/{code}/cancel", post(bookings::cancel_booking))
}
