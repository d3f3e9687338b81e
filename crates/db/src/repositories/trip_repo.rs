//! Repository for the `trips` table.

use radiotaxi_core::booking::Trip;
use sqlx::PgExecutor;

use crate::models::trip::TripRow;

const COLUMNS: &str = "booking_code, driver_id, duration_minutes, observation, realized_at";

pub struct TripRepo;

impl TripRepo {
    pub async fn insert<'e, E>(executor: E, trip: &Trip) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO trips (booking_code, driver_id, duration_minutes, observation, realized_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&trip.booking_code)
        .bind(trip.driver_id)
        .bind(trip.duration_minutes)
        .bind(&trip.observation)
        .bind(trip.realized_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_by_booking<'e, E>(
        executor: E,
        booking_code: &str,
    ) -> Result<Option<TripRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM trips WHERE booking_code = $1");
        sqlx::query_as::<_, TripRow>(&query)
            .bind(booking_code)
            .fetch_optional(executor)
            .await
    }
}
