use std::sync::Arc;

use radiotaxi_core::guard::AccessGuard;
use radiotaxi_core::lifecycle::BookingLifecycle;
use radiotaxi_core::ports::{RandomCodeGenerator, SystemClock};
use radiotaxi_db::PgStore;

use crate::config::ServerConfig;

/// The booking lifecycle wired to PostgreSQL and the wall clock.
pub type Lifecycle = BookingLifecycle<PgStore, SystemClock, RandomCodeGenerator>;

/// The access guard wired to PostgreSQL and the wall clock.
pub type Guard = AccessGuard<PgStore, SystemClock>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: radiotaxi_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub lifecycle: Arc<Lifecycle>,
    pub guard: Arc<Guard>,
}

impl AppState {
    pub fn new(pool: radiotaxi_db::DbPool, config: ServerConfig) -> Self {
        let store = PgStore::new(pool.clone());
        Self {
            lifecycle: Arc::new(BookingLifecycle::new(
                store.clone(),
                SystemClock,
                RandomCodeGenerator,
            )),
            guard: Arc::new(AccessGuard::new(store, SystemClock)),
            config: Arc::new(config),
            pool,
        }
    }
}
