//! Receipt row model.

use radiotaxi_core::booking::{PaymentMethod, Receipt};
use radiotaxi_core::error::CoreError;
use radiotaxi_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ReceiptRow {
    pub id: DbId,
    pub booking_code: String,
    pub total: Decimal,
    pub payment_method: String,
    pub issued_at: Timestamp,
}

impl TryFrom<ReceiptRow> for Receipt {
    type Error = CoreError;

    fn try_from(row: ReceiptRow) -> Result<Self, Self::Error> {
        let payment_method = PaymentMethod::from_name(&row.payment_method).map_err(|_| {
            CoreError::InvalidBookingData(format!(
                "Receipt {} has unknown payment method '{}'",
                row.id, row.payment_method
            ))
        })?;
        Ok(Self {
            id: row.id,
            booking_code: row.booking_code,
            total: row.total,
            payment_method,
            issued_at: row.issued_at,
        })
    }
}
