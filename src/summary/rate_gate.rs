use once_cell::sync::OnceCell;
use std::time::Duration;
use tokio::{
    sync::Mutex,
    time::{Instant, Interval, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::summary::errors::SummaryError;

/// Spaces backend calls at least one period apart.
///
/// The ticker is created by the first caller and shared afterwards. The first
/// admission happens one full period after that.
#[derive(Debug)]
pub struct RateGate {
    period: Option<Duration>,
    ticker: OnceCell<Mutex<Interval>>,
}

impl RateGate {
    /// `0` disables the gate.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let period = (requests_per_minute > 0).then(|| Duration::from_secs(60) / requests_per_minute);
        Self {
            period,
            ticker: OnceCell::new(),
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Blocks until the next tick, or fails as soon as `cancel` fires.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), SummaryError> {
        let Some(period) = self.period else {
            return Ok(());
        };

        let ticker = self.ticker.get_or_init(|| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Mutex::new(ticker)
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SummaryError::Cancelled),
            _ = async { ticker.lock().await.tick().await } => {
                debug!("rate limiter allowed request");
                Ok(())
            }
        }
    }
}
