pub mod auth;
pub mod bookings;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                     login (public)
/// /auth/logout                    logout
/// /auth/me                        current user
///
/// /bookings                       list, create
/// /bookings/{code}                get
/// /bookings/{code}/history        history ledger
/// /bookings/{code}/validation     approve, reassign or reject
/// /bookings/{code}/start          start trip
/// /bookings/{code}/pickup         mark pickup
/// /bookings/{code}/complete       complete trip
/// /bookings/{code}/cancel         cancel
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/bookings", bookings::router())
}
