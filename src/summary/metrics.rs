use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Summary usage counters shared by every request of the process.
#[derive(Debug, Default)]
pub struct UsageMetrics {
    counters: Mutex<Counters>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    cache_hits: u64,
    cache_misses: u64,
    total_requests: u64,
    failed_requests: u64,
    total_response_time: Duration,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_requests: u64,
    pub failed_requests: u64,
    /// Accumulated backend latency divided by total requests.
    pub average_response_ms: u64,
}

impl UsageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.update(|c| c.cache_hits += 1);
    }

    /// A miss is also a request to the backend.
    pub fn record_miss(&self) {
        self.update(|c| {
            c.cache_misses += 1;
            c.total_requests += 1;
        });
    }

    pub fn record_failure(&self) {
        self.update(|c| c.failed_requests += 1);
    }

    pub fn record_latency(&self, elapsed: Duration) {
        self.update(|c| c.total_response_time += elapsed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = *self.counters.lock().unwrap_or_else(PoisonError::into_inner);

        let average_response_ms = if c.total_requests > 0 {
            (c.total_response_time.as_millis() / u128::from(c.total_requests)) as u64
        } else {
            0
        };

        MetricsSnapshot {
            cache_hits: c.cache_hits,
            cache_misses: c.cache_misses,
            total_requests: c.total_requests,
            failed_requests: c.failed_requests,
            average_response_ms,
        }
    }

    fn update(&self, f: impl FnOnce(&mut Counters)) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut counters);
    }
}
