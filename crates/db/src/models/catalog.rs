//! Taxis, services, rates and offerings.

use radiotaxi_core::booking::{Offering, Taxi};
use radiotaxi_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct TaxiRow {
    pub plate: String,
    pub model: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl From<TaxiRow> for Taxi {
    fn from(row: TaxiRow) -> Self {
        Self {
            plate: row.plate,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug)]
pub struct CreateTaxi {
    pub plate: String,
    pub model: Option<String>,
}

/// An `offerings` row joined with its service and rate.
#[derive(Debug, Clone, FromRow)]
pub struct OfferingRow {
    pub service_code: String,
    pub service_name: String,
    pub rate_id: DbId,
    pub rate_price: Option<Decimal>,
}

impl From<OfferingRow> for Offering {
    fn from(row: OfferingRow) -> Self {
        Self {
            service_code: row.service_code,
            service_name: row.service_name,
            rate_id: row.rate_id,
            rate_price: row.rate_price,
        }
    }
}

/// DTO for registering a service at a new rate.
#[derive(Debug)]
pub struct CreateOffering {
    pub service_code: String,
    pub service_name: String,
    pub rate_name: String,
    /// `None` creates a rate that cannot be billed.
    pub price: Option<Decimal>,
}
