//! Repository for services, rates and the `offerings` join table.

use radiotaxi_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::catalog::{CreateOffering, OfferingRow};

const SELECT: &str = "SELECT o.service_code, s.name AS service_name, o.rate_id, r.price AS rate_price
                      FROM offerings o
                      JOIN services s ON s.code = o.service_code
                      JOIN rates r ON r.id = o.rate_id";

pub struct OfferingRepo;

impl OfferingRepo {
    pub async fn find<'e, E>(
        executor: E,
        service_code: &str,
        rate_id: DbId,
    ) -> Result<Option<OfferingRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("{SELECT} WHERE o.service_code = $1 AND o.rate_id = $2");
        sqlx::query_as::<_, OfferingRow>(&query)
            .bind(service_code)
            .bind(rate_id)
            .fetch_optional(executor)
            .await
    }

    /// Register a service (created if missing) at a new rate.
    pub async fn create(pool: &PgPool, input: &CreateOffering) -> Result<OfferingRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO services (code, name) VALUES ($1, $2)
             ON CONFLICT (code) DO NOTHING",
        )
        .bind(&input.service_code)
        .bind(&input.service_name)
        .execute(&mut *tx)
        .await?;

        let rate_id: DbId =
            sqlx::query_scalar("INSERT INTO rates (name, price) VALUES ($1, $2) RETURNING id")
                .bind(&input.rate_name)
                .bind(input.price)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query("INSERT INTO offerings (service_code, rate_id) VALUES ($1, $2)")
            .bind(&input.service_code)
            .bind(rate_id)
            .execute(&mut *tx)
            .await?;

        let query = format!("{SELECT} WHERE o.service_code = $1 AND o.rate_id = $2");
        let row = sqlx::query_as::<_, OfferingRow>(&query)
            .bind(&input.service_code)
            .bind(rate_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }
}
