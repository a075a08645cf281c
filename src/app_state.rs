use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::extractor::{ArticleResult, ExtractError, ExtractionRule, Extractor, RuleStore};
use crate::fetcher::FetchError;
use crate::summary::{
    BackendError, MetricsSnapshot, OpenAiBackend, Summarizer, SummaryError, SummaryStore,
    UsageMetrics, backend, spawn_cleanup_task,
};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("page fetcher setup failed")]
    Fetch(#[from] FetchError),

    #[error("summary backend setup failed")]
    Backend(#[from] BackendError),
}

/// Everything a caller needs to extract and summarize articles.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Extractor,
    pub summarizer: Arc<Summarizer>,
}

impl AppState {
    pub fn new(extractor: Extractor, summarizer: Summarizer) -> Self {
        Self {
            extractor,
            summarizer: Arc::new(summarizer),
        }
    }

    /// Wires the extractor and an OpenAI-compatible summarizer from `config`.
    pub fn from_config(
        config: &Config,
        rules: Option<Arc<dyn RuleStore>>,
        store: Option<Arc<dyn SummaryStore>>,
    ) -> Result<Self, SetupError> {
        let mut extractor = Extractor::new(&config.extractor_config())?;
        if let Some(rules) = rules {
            extractor = extractor.with_rules(rules);
        }

        let completions = OpenAiBackend::new(
            backend::build_client(backend::DEFAULT_TIMEOUT)?,
            config.base_url(),
            config.api_key().unwrap_or_default(),
            config.model(),
        );
        let mut summarizer = Summarizer::new(
            config.summary_config(),
            Arc::new(completions),
            Arc::new(UsageMetrics::new()),
        );
        if let Some(store) = store {
            summarizer = summarizer.with_store(store);
        }

        Ok(Self::new(extractor, summarizer))
    }

    pub async fn extract(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<ArticleResult, ExtractError> {
        self.extractor.extract(cancel, url).await
    }

    pub async fn extract_with_rule(
        &self,
        cancel: &CancellationToken,
        url: &str,
        rule: Option<&ExtractionRule>,
    ) -> Result<ArticleResult, ExtractError> {
        self.extractor.extract_with_rule(cancel, url, rule).await
    }

    pub async fn summarize(
        &self,
        cancel: &CancellationToken,
        content: &str,
    ) -> Result<String, SummaryError> {
        self.summarizer.summarize(cancel, content).await
    }

    /// Extracts `url` and attaches a summary of its content. Summary failures
    /// are logged and leave `summary` unset.
    pub async fn extract_with_summary(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<ArticleResult, ExtractError> {
        let mut article = self.extract(cancel, url).await?;
        match self.summarize(cancel, &article.content).await {
            Ok(summary) => article.summary = Some(summary),
            Err(e) => warn!(error = %e, url = %article.url, "summary generation failed"),
        }
        Ok(article)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.summarizer.metrics()
    }

    /// Starts the expired-summary sweep when a store is configured.
    pub fn start_cleanup(&self, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let Some(store) = self.summarizer.store() else {
            info!("no summary store configured, cleanup task not started");
            return None;
        };
        Some(spawn_cleanup_task(
            store.clone(),
            self.summarizer.config().cleanup_interval,
            cancel,
        ))
    }
}
