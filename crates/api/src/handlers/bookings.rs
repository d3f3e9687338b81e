//! Handlers for the `/bookings` resource.
//!
//! Thin adapters: decode and validate the request body, call the booking
//! lifecycle as the session user, wrap the result in [`DataResponse`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use radiotaxi_core::booking::{
    Booking, BookingFilter, BookingStatus, BookingType, CompleteTrip, CompletedTrip, Decision,
    HistoryEntry, NewBooking, PaymentMethod, ValidateBooking,
};
use radiotaxi_core::types::{DbId, Timestamp};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::SessionUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /bookings`.
#[derive(Debug, Default, Deserialize)]
pub struct ListBookingsParams {
    /// Status name, e.g. `PENDIENTE`.
    pub state: Option<String>,
    /// Calendar day (UTC) of the requested pickup time.
    pub date: Option<NaiveDate>,
    pub user_id: Option<DbId>,
}

impl ListBookingsParams {
    fn into_filter(self) -> AppResult<BookingFilter> {
        let status = self
            .state
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| BookingStatus::from_name(&s.to_ascii_uppercase()))
            .transpose()?;
        Ok(BookingFilter {
            status,
            date: self.date,
            user_id: self.user_id,
        })
    }
}

/// Request body for `POST /bookings`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 255))]
    pub origin: String,
    #[validate(length(min = 1, max = 255))]
    pub destination: String,
    /// Required for `PROGRAMADO`; defaults to now otherwise.
    pub requested_at: Option<Timestamp>,
    pub booking_type: BookingType,
    #[validate(length(max = 1000))]
    pub observation: Option<String>,
    #[validate(length(min = 1))]
    pub service_code: String,
    pub rate_id: DbId,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(req: CreateBookingRequest) -> Self {
        Self {
            origin: req.origin,
            destination: req.destination,
            requested_at: req.requested_at,
            booking_type: req.booking_type,
            observation: req.observation,
            service_code: req.service_code,
            rate_id: req.rate_id,
        }
    }
}

/// Request body for `POST /bookings/{code}/validation`.
#[derive(Debug, Deserialize, Validate)]
pub struct ValidationRequest {
    /// `APROBAR` or `RECHAZAR`.
    pub decision: Decision,
    pub driver_id: Option<DbId>,
    #[validate(length(min = 1, max = 20))]
    pub taxi_plate: Option<String>,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
    /// Replace the assignment of a PENDIENTE booking instead of confirming a
    /// new one.
    #[serde(default)]
    pub reassign: bool,
}

impl From<ValidationRequest> for ValidateBooking {
    fn from(req: ValidationRequest) -> Self {
        Self {
            decision: req.decision,
            driver_id: req.driver_id,
            taxi_plate: req.taxi_plate,
            reason: req.reason,
            reassign: req.reassign,
        }
    }
}

/// Request body for `POST /bookings/{code}/complete`.
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteTripRequest {
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
    #[validate(length(max = 1000))]
    pub observation: Option<String>,
    /// `EFECTIVO`, `TARJETA` or `TRANSFERENCIA`.
    pub payment_method: PaymentMethod,
}

impl From<CompleteTripRequest> for CompleteTrip {
    fn from(req: CompleteTripRequest) -> Self {
        Self {
            duration_minutes: req.duration_minutes,
            observation: req.observation,
            payment_method: req.payment_method,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// GET /api/v1/bookings?state=&date=&user_id=
pub async fn list_bookings(
    State(state): State<AppState>,
    auth: SessionUser,
    Query(params): Query<ListBookingsParams>,
) -> AppResult<Json<DataResponse<Vec<Booking>>>> {
    let filter = params.into_filter()?;
    let bookings = state.lifecycle.get_bookings(&auth.user, filter).await?;
    Ok(Json(DataResponse { data: bookings }))
}

/// GET /api/v1/bookings/{code}
pub async fn get_booking(
    State(state): State<AppState>,
    auth: SessionUser,
    Path(code): Path<String>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = state.lifecycle.get_booking(&auth.user, &code).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// GET /api/v1/bookings/{code}/history
pub async fn get_history(
    State(state): State<AppState>,
    auth: SessionUser,
    Path(code): Path<String>,
) -> AppResult<Json<DataResponse<Vec<HistoryEntry>>>> {
    let history = state.lifecycle.history(&auth.user, &code).await?;
    Ok(Json(DataResponse { data: history }))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// POST /api/v1/bookings
///
/// Register a booking for the session user. Returns 201 with the booking in
/// `EN_REVISION`.
pub async fn create_booking(
    State(state): State<AppState>,
    auth: SessionUser,
    Json(input): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Booking>>)> {
    input.validate()?;
    let booking = state
        .lifecycle
        .create_booking(&auth.user, input.into())
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: booking })))
}

/// POST /api/v1/bookings/{code}/validation
pub async fn validate_booking(
    State(state): State<AppState>,
    auth: SessionUser,
    Path(code): Path<String>,
    Json(input): Json<ValidationRequest>,
) -> AppResult<Json<DataResponse<Booking>>> {
    input.validate()?;
    let booking = state
        .lifecycle
        .validate_and_assign(&auth.user, &code, input.into())
        .await?;
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/bookings/{code}/start
pub async fn start_trip(
    State(state): State<AppState>,
    auth: SessionUser,
    Path(code): Path<String>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = state.lifecycle.start_trip(&auth.user, &code).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/bookings/{code}/pickup
pub async fn mark_pickup(
    State(state): State<AppState>,
    auth: SessionUser,
    Path(code): Path<String>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = state.lifecycle.mark_pickup(&auth.user, &code).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/bookings/{code}/complete
///
/// Returns the completed booking with its trip and receipt.
pub async fn complete_trip(
    State(state): State<AppState>,
    auth: SessionUser,
    Path(code): Path<String>,
    Json(input): Json<CompleteTripRequest>,
) -> AppResult<Json<DataResponse<CompletedTrip>>> {
    input.validate()?;
    let completed = state
        .lifecycle
        .complete_trip(&auth.user, &code, input.into())
        .await?;
    Ok(Json(DataResponse { data: completed }))
}

/// POST /api/v1/bookings/{code}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    auth: SessionUser,
    Path(code): Path<String>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = state.lifecycle.cancel_booking(&auth.user, &code).await?;
    Ok(Json(DataResponse { data: booking }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_param_is_case_insensitive() {
        let params = ListBookingsParams {
            state: Some("pendiente".into()),
            ..Default::default()
        };
        assert_eq!(
            params.into_filter().unwrap().status,
            Some(BookingStatus::Pendiente)
        );
    }

    #[test]
    fn blank_state_param_means_no_filter() {
        let params = ListBookingsParams {
            state: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(params.into_filter().unwrap().status, None);
    }

    #[test]
    fn unknown_state_param_is_rejected() {
        let params = ListBookingsParams {
            state: Some("PERDIDO".into()),
            ..Default::default()
        };
        assert!(params.into_filter().is_err());
    }

    #[test]
    fn create_request_requires_addresses() {
        let req = CreateBookingRequest {
            origin: String::new(),
            destination: "Plaza Mayor".into(),
            requested_at: None,
            booking_type: BookingType::Normal,
            observation: None,
            service_code: "EJECUTIVO".into(),
            rate_id: 1,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("origin"));
    }

    #[test]
    fn complete_request_requires_positive_duration() {
        let req = CompleteTripRequest {
            duration_minutes: 0,
            observation: None,
            payment_method: PaymentMethod::Efectivo,
        };
        assert!(req.validate().is_err());
    }
}
