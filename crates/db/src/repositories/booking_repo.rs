//! Repository for the `bookings` table.

use radiotaxi_core::booking::{Booking, BookingFilter};
use sqlx::PgExecutor;

use crate::models::booking::{BookingRow, StateColumns};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "code, client_id, origin, destination, requested_at, booking_type, \
                       observation, service_code, rate_id, status, driver_id, taxi_plate, \
                       realized_at, rejection_reason, deleted_at, created_at, updated_at";

pub struct BookingRepo;

impl BookingRepo {
    pub async fn find_by_code<'e, E>(
        executor: E,
        code: &str,
    ) -> Result<Option<BookingRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE code = $1");
        sqlx::query_as::<_, BookingRow>(&query)
            .bind(code)
            .fetch_optional(executor)
            .await
    }

    /// Load a booking and lock its row until the surrounding transaction
    /// ends. Must run inside a transaction.
    pub async fn lock<'e, E>(executor: E, code: &str) -> Result<Option<BookingRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE code = $1 FOR UPDATE");
        sqlx::query_as::<_, BookingRow>(&query)
            .bind(code)
            .fetch_optional(executor)
            .await
    }

    pub async fn insert<'e, E>(executor: E, booking: &Booking) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let state = StateColumns::from(&booking.state);
        sqlx::query(
            "INSERT INTO bookings (code, client_id, origin, destination, requested_at, \
                 booking_type, observation, service_code, rate_id, status, driver_id, \
                 taxi_plate, realized_at, rejection_reason, deleted_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(&booking.code)
        .bind(booking.client_id)
        .bind(&booking.origin)
        .bind(&booking.destination)
        .bind(booking.requested_at)
        .bind(booking.booking_type.as_str())
        .bind(&booking.observation)
        .bind(&booking.offering.service_code)
        .bind(booking.offering.rate_id)
        .bind(state.status)
        .bind(state.driver_id)
        .bind(state.taxi_plate)
        .bind(state.realized_at)
        .bind(state.rejection_reason)
        .bind(state.deleted_at)
        .bind(booking.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Write the state columns of a booking. Returns `true` if a row changed.
    pub async fn update_state<'e, E>(executor: E, booking: &Booking) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let state = StateColumns::from(&booking.state);
        let result = sqlx::query(
            "UPDATE bookings SET
                status = $2,
                driver_id = $3,
                taxi_plate = $4,
                realized_at = $5,
                rejection_reason = $6,
                deleted_at = $7,
                updated_at = NOW()
             WHERE code = $1",
        )
        .bind(&booking.code)
        .bind(state.status)
        .bind(state.driver_id)
        .bind(state.taxi_plate)
        .bind(state.realized_at)
        .bind(state.rejection_reason)
        .bind(state.deleted_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List bookings matching `filter`, newest requested time first.
    ///
    /// Without a status filter, cancelled (soft-deleted) bookings are
    /// excluded. The date filter compares the UTC calendar day.
    pub async fn list<'e, E>(
        executor: E,
        filter: &BookingFilter,
    ) -> Result<Vec<BookingRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings
             WHERE (($1::TEXT IS NULL AND deleted_at IS NULL) OR status = $1)
               AND ($2::DATE IS NULL OR (requested_at AT TIME ZONE 'UTC')::DATE = $2)
               AND ($3::BIGINT IS NULL OR client_id = $3 OR driver_id = $3)
             ORDER BY requested_at DESC, code ASC"
        );
        sqlx::query_as::<_, BookingRow>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.date)
            .bind(filter.user_id)
            .fetch_all(executor)
            .await
    }
}
