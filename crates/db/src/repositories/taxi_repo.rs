//! Repository for the `taxis` table.

use sqlx::{PgExecutor, PgPool};

use crate::models::catalog::{CreateTaxi, TaxiRow};

const COLUMNS: &str = "plate, model, is_active, created_at";

pub struct TaxiRepo;

impl TaxiRepo {
    pub async fn find_by_plate<'e, E>(executor: E, plate: &str) -> Result<Option<TaxiRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM taxis WHERE plate = $1");
        sqlx::query_as::<_, TaxiRow>(&query)
            .bind(plate)
            .fetch_optional(executor)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CreateTaxi) -> Result<TaxiRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO taxis (plate, model) VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaxiRow>(&query)
            .bind(input.plate.trim().to_uppercase())
            .bind(&input.model)
            .fetch_one(pool)
            .await
    }

    /// Returns `true` if the row was updated.
    pub async fn set_active(pool: &PgPool, plate: &str, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE taxis SET is_active = $2 WHERE plate = $1")
            .bind(plate)
            .bind(active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
