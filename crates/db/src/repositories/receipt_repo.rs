//! Repository for the `receipts` table.

use radiotaxi_core::booking::NewReceipt;
use sqlx::PgExecutor;

use crate::models::receipt::ReceiptRow;

const COLUMNS: &str = "id, booking_code, total, payment_method, issued_at";

pub struct ReceiptRepo;

impl ReceiptRepo {
    pub async fn insert<'e, E>(executor: E, receipt: &NewReceipt) -> Result<ReceiptRow, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO receipts (booking_code, total, payment_method, issued_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReceiptRow>(&query)
            .bind(&receipt.booking_code)
            .bind(receipt.total)
            .bind(receipt.payment_method.as_str())
            .bind(receipt.issued_at)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_booking<'e, E>(
        executor: E,
        booking_code: &str,
    ) -> Result<Option<ReceiptRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM receipts WHERE booking_code = $1");
        sqlx::query_as::<_, ReceiptRow>(&query)
            .bind(booking_code)
            .fetch_optional(executor)
            .await
    }
}
