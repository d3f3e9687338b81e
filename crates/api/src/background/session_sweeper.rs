//! Periodic deletion of expired sessions.
//!
//! Sessions are also purged lazily when an expired token is presented; the
//! sweeper removes the ones nobody presents again.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::state::Guard;

/// Run the sweep loop until `cancel` is triggered. The first sweep happens
/// immediately.
pub async fn run(guard: Arc<Guard>, every: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = every.as_secs(),
        "Session sweeper started"
    );

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                match guard.purge_expired().await {
                    Ok(0) => tracing::debug!("Session sweeper: nothing to purge"),
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Session sweeper: purge failed"),
                }
            }
        }
    }
}
