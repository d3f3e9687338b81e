use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Newest migration applied to the database.
    pub schema_version: Option<i64>,
    /// Newest migration this build ships. A lower `schema_version` means the
    /// booking tables may be missing columns this build writes.
    pub expected_schema_version: Option<i64>,
}

/// GET /health -- database reachability and schema currency.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = radiotaxi_db::health_check(&state.pool).await.is_ok();
    let schema_version = if db_healthy {
        radiotaxi_db::applied_schema_version(&state.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Could not read applied schema version");
                None
            })
    } else {
        None
    };
    let expected_schema_version = radiotaxi_db::expected_schema_version();

    let status = if db_healthy && schema_version >= expected_schema_version {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        schema_version,
        expected_schema_version,
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
