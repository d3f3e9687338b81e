//! Trip row model.

use radiotaxi_core::booking::Trip;
use radiotaxi_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct TripRow {
    pub booking_code: String,
    pub driver_id: DbId,
    pub duration_minutes: i32,
    pub observation: Option<String>,
    pub realized_at: Timestamp,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Self {
            booking_code: row.booking_code,
            driver_id: row.driver_id,
            duration_minutes: row.duration_minutes,
            observation: row.observation,
            realized_at: row.realized_at,
        }
    }
}
