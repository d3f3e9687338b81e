//! Booking row model.
//!
//! The table stores the state flat (`status` plus nullable assignment and
//! terminal columns); [`BookingRow`] converts into the typed
//! [`BookingState`] and rejects rows that break the assignment invariant.

use radiotaxi_core::booking::{
    Booking, BookingState, BookingStatus, BookingType, OfferingRef,
};
use radiotaxi_core::error::CoreError;
use radiotaxi_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub code: String,
    pub client_id: DbId,
    pub origin: String,
    pub destination: String,
    pub requested_at: Timestamp,
    pub booking_type: String,
    pub observation: Option<String>,
    pub service_code: String,
    pub rate_id: DbId,
    pub status: String,
    pub driver_id: Option<DbId>,
    pub taxi_plate: Option<String>,
    pub realized_at: Option<Timestamp>,
    pub rejection_reason: Option<String>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::from_name(&row.status).map_err(|_| {
            CoreError::InvalidBookingData(format!(
                "Booking {} has unknown status '{}'",
                row.code, row.status
            ))
        })?;
        let booking_type = BookingType::from_name(&row.booking_type).map_err(|_| {
            CoreError::InvalidBookingData(format!(
                "Booking {} has unknown type '{}'",
                row.code, row.booking_type
            ))
        })?;
        let state = BookingState::from_parts(
            status,
            row.driver_id,
            row.taxi_plate,
            row.realized_at,
            row.rejection_reason,
            row.deleted_at,
        )?;

        Ok(Self {
            code: row.code,
            client_id: row.client_id,
            origin: row.origin,
            destination: row.destination,
            requested_at: row.requested_at,
            booking_type,
            observation: row.observation,
            offering: OfferingRef {
                service_code: row.service_code,
                rate_id: row.rate_id,
            },
            state,
            created_at: row.created_at,
        })
    }
}

/// Flat column values of a [`BookingState`], for writes.
#[derive(Debug, Clone, PartialEq)]
pub struct StateColumns<'a> {
    pub status: &'static str,
    pub driver_id: Option<DbId>,
    pub taxi_plate: Option<&'a str>,
    pub realized_at: Option<Timestamp>,
    pub rejection_reason: Option<&'a str>,
    pub deleted_at: Option<Timestamp>,
}

impl<'a> From<&'a BookingState> for StateColumns<'a> {
    fn from(state: &'a BookingState) -> Self {
        let assignment = state.assignment();
        Self {
            status: state.status().as_str(),
            driver_id: assignment.map(|a| a.driver_id),
            taxi_plate: assignment.map(|a| a.taxi_plate.as_str()),
            realized_at: match state {
                BookingState::Completado { realized_at, .. } => Some(*realized_at),
                _ => None,
            },
            rejection_reason: match state {
                BookingState::Rechazado { reason } => Some(reason.as_str()),
                _ => None,
            },
            deleted_at: match state {
                BookingState::Cancelado { cancelled_at } => Some(*cancelled_at),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use radiotaxi_core::booking::Assignment;

    use super::*;

    fn row(status: &str, driver_id: Option<DbId>, taxi_plate: Option<&str>) -> BookingRow {
        let now = Utc::now();
        BookingRow {
            code: "RT-TEST0001".into(),
            client_id: 1,
            origin: "A".into(),
            destination: "B".into(),
            requested_at: now,
            booking_type: "NORMAL".into(),
            observation: None,
            service_code: "EJECUTIVO".into(),
            rate_id: 1,
            status: status.into(),
            driver_id,
            taxi_plate: taxi_plate.map(str::to_string),
            realized_at: None,
            rejection_reason: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pending_row_becomes_assigned_state() {
        let booking = Booking::try_from(row("PENDIENTE", Some(3), Some("T1"))).unwrap();
        assert_eq!(
            booking.state,
            BookingState::Pendiente {
                assignment: Assignment {
                    driver_id: 3,
                    taxi_plate: "T1".into()
                }
            }
        );
    }

    #[test]
    fn pending_row_without_taxi_is_rejected() {
        assert_matches!(
            Booking::try_from(row("PENDIENTE", Some(3), None)),
            Err(CoreError::InvalidBookingData(_))
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_matches!(
            Booking::try_from(row("CONFIRMADA", None, None)),
            Err(CoreError::InvalidBookingData(_))
        );
    }

    #[test]
    fn state_columns_flatten_rejection() {
        let state = BookingState::Rechazado {
            reason: "no units".into(),
        };
        let cols = StateColumns::from(&state);
        assert_eq!(cols.status, "RECHAZADO");
        assert_eq!(cols.rejection_reason, Some("no units"));
        assert_eq!(cols.driver_id, None);
        assert_eq!(cols.deleted_at, None);
    }
}
