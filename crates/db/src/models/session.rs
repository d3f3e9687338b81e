//! Session model.

use radiotaxi_core::access::Session;
use radiotaxi_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `sessions` table. `id` is the token hash.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}
