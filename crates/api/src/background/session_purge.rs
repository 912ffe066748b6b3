//! Periodic removal of expired refresh sessions.
//!
//! Refresh rejects expired sessions lazily; this job keeps sessions that are
//! never presented again from accumulating.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::AuthService;

/// Run the purge loop every `period` until `cancel` is triggered.
///
/// The first purge happens immediately. Failures are logged and the loop
/// keeps going.
pub async fn run(auth: Arc<AuthService>, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Session purge job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session purge job stopping");
                break;
            }
            _ = interval.tick() => {
                match auth.purge_expired_sessions().await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Session purge: removed expired sessions");
                        } else {
                            tracing::debug!("Session purge: nothing to remove");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session purge failed");
                    }
                }
            }
        }
    }
}
