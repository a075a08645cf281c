pub mod cleaner;
pub mod errors;
pub mod images;
pub mod model;
pub mod reader;
pub mod rules;
pub mod strategy;
pub mod text;

#[cfg(test)]
mod tests;

pub use errors::ExtractError;
pub use model::{ArticleResult, Extracted};
pub use reader::{GenericParser, ReadabilityParser};
pub use rules::{ExtractionRule, MemoryRuleStore, RuleStore};
pub use strategy::Strategy;

use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::fetcher::{FetchError, Fetcher, types::PageResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Bound on every outbound request: the page and each image probe.
    pub timeout: Duration,
    /// Maximum excerpt length, in characters.
    pub snippet_size: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            snippet_size: 300,
        }
    }
}

/// Fetches pages and turns them into [`ArticleResult`]s.
#[derive(Clone)]
pub struct Extractor {
    fetcher: Fetcher,
    rules: Option<Arc<dyn RuleStore>>,
    parser: Arc<dyn GenericParser>,
    snippet_size: usize,
}

impl Extractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: Fetcher::new(config.timeout)?,
            rules: None,
            parser: Arc::new(ReadabilityParser),
            snippet_size: config.snippet_size,
        })
    }

    pub fn with_rules(mut self, rules: Arc<dyn RuleStore>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn GenericParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub async fn extract(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<ArticleResult, ExtractError> {
        self.extract_with_rule(cancel, url, None).await
    }

    /// Extracts the article at `url`.
    ///
    /// With `rule` set, only that rule is applied and its failure is returned.
    /// Without it, the stored rule for the final host is tried first and the
    /// generic parser covers for it.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn extract_with_rule(
        &self,
        cancel: &CancellationToken,
        url: &str,
        rule: Option<&ExtractionRule>,
    ) -> Result<ArticleResult, ExtractError> {
        info!("extracting article");
        let page = self.fetcher.fetch(cancel, url).await?;
        let domain = page.domain().to_string();

        let strategy = Strategy::decide(rule, self.rules.as_deref(), &domain).await;
        let extracted = self.run(strategy, &page)?;

        let title = reader::page_title(&page.body_utf8).unwrap_or_else(|| domain.clone());
        let content = text::normalize(&extracted.text, &title);
        if content.is_empty() {
            return Err(ExtractError::NothingExtracted(page.url_final.to_string()));
        }

        let rich = cleaner::sanitize(&extracted.rich);
        let (rich, all_links) = cleaner::absolutize(&rich, &page.url_final);
        let excerpt = text::excerpt(&content, self.snippet_size);

        let (image, all_images) =
            match images::select_lead_image(&self.fetcher, cancel, &rich, &page.url_final).await {
                Some(lead) => (Some(lead.image), lead.all_images),
                None => (None, Vec::new()),
            };

        info!(%title, url = %page.url_final, "extraction completed");
        Ok(ArticleResult {
            url: page.url_final.to_string(),
            domain,
            title,
            excerpt,
            content,
            rich,
            all_links,
            image,
            all_images,
            content_type: page.content_type,
            charset: page.charset,
            summary: None,
        })
    }

    fn run(&self, strategy: Strategy, page: &PageResponse) -> Result<Extracted, ExtractError> {
        match strategy {
            Strategy::UseRule { rule, fallback } => {
                match strategy::extract_by_rule(&page.body_utf8, &rule) {
                    Ok(extracted) => {
                        info!(domain = %rule.domain, "custom rule processed");
                        Ok(extracted)
                    }
                    Err(e) if fallback && e.is_rule_failure() => {
                        warn!(error = %e, "custom extractor failed, using generic parser");
                        self.generic(page)
                    }
                    Err(e) => Err(e),
                }
            }
            Strategy::UseGeneric => self.generic(page),
        }
    }

    fn generic(&self, page: &PageResponse) -> Result<Extracted, ExtractError> {
        let extracted = self.parser.parse(&page.body_utf8, &page.url_final)?;
        if extracted.text.trim().is_empty() && extracted.rich.trim().is_empty() {
            return Err(ExtractError::NothingExtracted(page.url_final.to_string()));
        }
        Ok(extracted)
    }
}
