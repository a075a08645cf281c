pub mod backend;
pub mod cache;
pub mod errors;
pub mod metrics;
pub mod rate_gate;
pub mod sweep;

pub use backend::{CompletionBackend, OpenAiBackend};
pub use cache::{CachedSummary, MemorySummaryStore, SummaryStore, content_hash};
pub use errors::{BackendError, StoreError, SummaryError};
pub use metrics::{MetricsSnapshot, UsageMetrics};
pub use rate_gate::RateGate;
pub use sweep::{spawn_cleanup_task, sweep_once};

use chrono::{TimeDelta, Utc};
use std::{borrow::Cow, sync::Arc, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

pub const DEFAULT_SUMMARY_PROMPT: &str = "You are a helpful assistant that summarizes articles. Please summarize the main points in a few sentences as TLDR style (don't add a TLDR label). Then, list up to five detailed bullet points. Provide the response in plain text. Do not add any additional information. Do not add a Summary at the beginning of the response. If detailed bullet points are too similar to the summary, don't include them at all:";

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Marker appended to content cut at `max_content_length`.
pub const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    /// Replaces [`DEFAULT_SUMMARY_PROMPT`] when set.
    pub prompt: Option<String>,
    /// Characters sent to the backend; `0` sends everything.
    pub max_content_length: usize,
    /// `0` disables throttling.
    pub requests_per_minute: u32,
    pub cache_ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            prompt: None,
            max_content_length: 10_000,
            requests_per_minute: 10,
            cache_ttl: DEFAULT_CACHE_TTL,
            cleanup_interval: sweep::DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

/// Cache-first, throttled access to the summarization backend.
pub struct Summarizer {
    config: SummaryConfig,
    backend: Arc<dyn CompletionBackend>,
    store: Option<Arc<dyn SummaryStore>>,
    metrics: Arc<UsageMetrics>,
    gate: RateGate,
}

impl Summarizer {
    pub fn new(
        config: SummaryConfig,
        backend: Arc<dyn CompletionBackend>,
        metrics: Arc<UsageMetrics>,
    ) -> Self {
        let gate = RateGate::per_minute(config.requests_per_minute);
        Self {
            config,
            backend,
            store: None,
            metrics,
            gate,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SummaryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&Arc<dyn SummaryStore>> {
        self.store.as_ref()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Unexpired cached summary of `content`.
    pub async fn cached(&self, content: &str) -> Option<CachedSummary> {
        let store = self.store.as_ref()?;
        store
            .get(&content_hash(content))
            .await
            .filter(|cached| !cached.is_expired(Utc::now()))
    }

    /// Summary of `content`, served from cache when a fresh entry exists.
    ///
    /// Misses wait for the rate gate and call the backend. A successful
    /// summary is cached, but a failure to cache it does not fail the call.
    #[instrument(skip_all, fields(content_len = content.len()))]
    pub async fn summarize(
        &self,
        cancel: &CancellationToken,
        content: &str,
    ) -> Result<String, SummaryError> {
        if !self.config.enabled {
            return Err(SummaryError::Disabled);
        }
        if self.config.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(SummaryError::KeyNotSet);
        }

        let hash = content_hash(content);
        if let Some(store) = &self.store
            && let Some(cached) = store.get(&hash).await
        {
            if !cached.is_expired(Utc::now()) {
                debug!("using cached summary for content");
                self.metrics.record_hit();
                return Ok(cached.summary);
            }
            debug!("cached summary has expired, regenerating");
        }

        self.metrics.record_miss();
        let source = truncate_content(content, self.config.max_content_length);

        if let Err(e) = self.gate.wait(cancel).await {
            self.metrics.record_failure();
            return Err(e);
        }

        let prompt = self
            .config
            .prompt
            .as_deref()
            .unwrap_or(DEFAULT_SUMMARY_PROMPT);

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = self.backend.complete(prompt, &source) => Some(res),
        };
        let elapsed = started.elapsed();

        let summary = match outcome {
            None => {
                self.metrics.record_failure();
                return Err(SummaryError::Cancelled);
            }
            Some(Err(e)) => {
                warn!(error = %e, ?elapsed, "summarization failed");
                self.metrics.record_failure();
                return Err(SummaryError::Backend(e));
            }
            Some(Ok(summary)) => summary,
        };

        self.metrics.record_latency(elapsed);
        self.persist(hash, source.into_owned(), &summary).await;

        Ok(summary)
    }

    async fn persist(&self, hash: String, source_content: String, summary: &str) {
        let Some(store) = &self.store else {
            return;
        };

        let now = Utc::now();
        let ttl = TimeDelta::from_std(self.config.cache_ttl).unwrap_or(TimeDelta::days(30));
        let expires_at = now.checked_add_signed(ttl).unwrap_or(now);

        let entry = CachedSummary {
            content_hash: hash,
            source_content,
            summary: summary.to_string(),
            model: self.backend.model().to_string(),
            created_at: now,
            updated_at: now,
            expires_at,
        };

        match store.set(entry).await {
            Ok(()) => debug!("summary cached successfully"),
            Err(e) => warn!(error = %e, "failed to cache summary"),
        }
    }
}

/// First `max_len` characters of `content` plus [`TRUNCATION_MARKER`].
pub fn truncate_content(content: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed(content);
    }
    match content.char_indices().nth(max_len) {
        Some((cut, _)) => {
            debug!(
                length = content.len(),
                max_len, "content exceeds maximum allowed, truncating"
            );
            Cow::Owned(format!("{}{TRUNCATION_MARKER}", &content[..cut]))
        }
        None => Cow::Borrowed(content),
    }
}
