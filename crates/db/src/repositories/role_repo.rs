//! Repository for `roles`, `permissions` and `role_permissions`.

use radiotaxi_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

pub struct RoleRepo;

impl RoleRepo {
    /// Resolve a role name (e.g. `"CONDUCTOR"`) to its id.
    pub async fn find_id_by_name(pool: &PgPool, name: &str) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Names of the permissions granted to a role, alphabetically.
    pub async fn permission_names<'e, E>(
        executor: E,
        role_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT p.name FROM role_permissions rp
             JOIN permissions p ON p.id = rp.permission_id
             WHERE rp.role_id = $1
             ORDER BY p.name ASC",
        )
        .bind(role_id)
        .fetch_all(executor)
        .await
    }
}
