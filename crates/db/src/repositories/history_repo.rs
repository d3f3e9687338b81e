//! Repository for the append-only `booking_history` table.

use radiotaxi_core::booking::NewHistoryEntry;
use sqlx::PgExecutor;

use crate::models::history::HistoryRow;

const COLUMNS: &str = "id, booking_code, action, status, observation, recorded_at";

pub struct HistoryRepo;

impl HistoryRepo {
    pub async fn append<'e, E>(
        executor: E,
        entry: &NewHistoryEntry,
    ) -> Result<HistoryRow, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO booking_history (booking_code, action, status, observation, recorded_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HistoryRow>(&query)
            .bind(&entry.booking_code)
            .bind(entry.action.as_str())
            .bind(entry.status.as_str())
            .bind(&entry.observation)
            .bind(entry.recorded_at)
            .fetch_one(executor)
            .await
    }

    /// Entries for one booking in insertion order.
    pub async fn list_for_booking<'e, E>(
        executor: E,
        booking_code: &str,
    ) -> Result<Vec<HistoryRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM booking_history WHERE booking_code = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, HistoryRow>(&query)
            .bind(booking_code)
            .fetch_all(executor)
            .await
    }
}
