//! Booking history row model.

use radiotaxi_core::booking::{BookingStatus, HistoryAction, HistoryEntry};
use radiotaxi_core::error::CoreError;
use radiotaxi_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    pub id: DbId,
    pub booking_code: String,
    pub action: String,
    pub status: String,
    pub observation: String,
    pub recorded_at: Timestamp,
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = CoreError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::from_name(&row.status).map_err(|_| {
            CoreError::InvalidBookingData(format!(
                "History entry {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;
        Ok(Self {
            id: row.id,
            booking_code: row.booking_code,
            action: HistoryAction::from_name(&row.action)?,
            status,
            observation: row.observation,
            recorded_at: row.recorded_at,
        })
    }
}
