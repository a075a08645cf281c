use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

use crate::summary::cache::SummaryStore;

pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Spawns the loop deleting expired summaries every `interval` until `cancel`
/// fires. A zero interval means daily.
pub fn spawn_cleanup_task(
    store: Arc<dyn SummaryStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let interval = if interval.is_zero() {
        DEFAULT_CLEANUP_INTERVAL
    } else {
        interval
    };

    tokio::spawn(
        async move {
            info!(?interval, "started summaries cleanup task");
            let mut ticker = interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("stopping summaries cleanup task");
                        return;
                    }
                    _ = ticker.tick() => {
                        sweep_once(store.as_ref()).await;
                    }
                }
            }
        }
        .instrument(info_span!("summary_cleanup")),
    )
}

/// One sweep; failures are logged and reported as `None`.
pub async fn sweep_once(store: &dyn SummaryStore) -> Option<u64> {
    info!("running expired summaries cleanup");
    match store.delete_expired(Utc::now()).await {
        Ok(removed) => {
            info!(removed, "cleaned up expired summaries");
            Some(removed)
        }
        Err(e) => {
            error!(error = %e, "failed to clean up expired summaries");
            None
        }
    }
}
