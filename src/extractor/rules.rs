use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Operator-authored extraction rule for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub domain: String,
    /// CSS selector; inner HTML of every match forms the article.
    #[serde(rename = "content")]
    pub selector: String,
    /// Selectors for nodes dropped from the matched fragment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
    pub enabled: bool,
}

impl ExtractionRule {
    pub fn new(domain: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            selector: selector.into(),
            excludes: Vec::new(),
            enabled: true,
        }
    }

    pub fn with_excludes<I, S>(mut self, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes = excludes.into_iter().map(Into::into).collect();
        self
    }
}

/// Read-only view of the rule store used during extraction.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Enabled rule registered for `host`, if any.
    async fn get(&self, host: &str) -> Option<ExtractionRule>;
}

/// Host-keyed rule store kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleStore {
    rules: Arc<DashMap<String, ExtractionRule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `rule`, replacing the previous rule of the same domain.
    pub fn insert(&self, rule: ExtractionRule) {
        self.rules.insert(rule.domain.clone(), rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn get(&self, host: &str) -> Option<ExtractionRule> {
        self.rules
            .get(host)
            .filter(|rule| rule.enabled)
            .map(|rule| rule.value().clone())
    }
}
