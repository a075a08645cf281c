//! Runtime configuration read from environment variables.
//!
//! Every setting has a default, so `Config::from_env` with an empty
//! environment yields a working extractor with summaries enabled but keyless.

use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::extractor::ExtractorConfig;
use crate::summary::{DEFAULT_CACHE_TTL, SummaryConfig, backend, sweep};

pub const ENV_TIMEOUT_SECS: &str = "UREADABLE_TIMEOUT_SECS";
pub const ENV_SNIPPET_SIZE: &str = "UREADABLE_SNIPPET_SIZE";
pub const ENV_DISABLE_SUMMARIES: &str = "OPENAI_DISABLE_SUMMARIES";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL_TYPE: &str = "OPENAI_MODEL_TYPE";
pub const ENV_SUMMARY_PROMPT: &str = "OPENAI_SUMMARY_PROMPT";
pub const ENV_MAX_CONTENT_LENGTH: &str = "OPENAI_MAX_CONTENT_LENGTH";
pub const ENV_REQUESTS_PER_MINUTE: &str = "OPENAI_REQUESTS_PER_MINUTE";
pub const ENV_CLEANUP_INTERVAL_SECS: &str = "OPENAI_CLEANUP_INTERVAL_SECS";
pub const ENV_CACHE_TTL_SECS: &str = "OPENAI_CACHE_TTL_SECS";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SNIPPET_SIZE: usize = 300;
const DEFAULT_MAX_CONTENT_LENGTH: usize = 10_000;
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    timeout: Duration,
    snippet_size: usize,
    disable_summaries: bool,
    api_key: Option<String>,
    model: String,
    prompt: Option<String>,
    max_content_length: usize,
    requests_per_minute: u32,
    cleanup_interval: Duration,
    cache_ttl: Duration,
    base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            snippet_size: DEFAULT_SNIPPET_SIZE,
            disable_summaries: false,
            api_key: None,
            model: backend::DEFAULT_MODEL.to_string(),
            prompt: None,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            cleanup_interval: sweep::DEFAULT_CLEANUP_INTERVAL,
            cache_ttl: DEFAULT_CACHE_TTL,
            base_url: backend::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load from environment variables, falling back to defaults for anything
    /// unset or empty. Values that are set but unparsable are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timeout = match parsed::<u64>(ENV_TIMEOUT_SECS)? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    field: ENV_TIMEOUT_SECS,
                    reason: "must be greater than zero".to_string(),
                });
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.timeout,
        };

        Ok(Self {
            timeout,
            snippet_size: parsed(ENV_SNIPPET_SIZE)?.unwrap_or(defaults.snippet_size),
            disable_summaries: parsed(ENV_DISABLE_SUMMARIES)?.unwrap_or(defaults.disable_summaries),
            api_key: non_empty(ENV_API_KEY),
            model: non_empty(ENV_MODEL_TYPE).unwrap_or(defaults.model),
            prompt: non_empty(ENV_SUMMARY_PROMPT),
            max_content_length: parsed(ENV_MAX_CONTENT_LENGTH)?
                .unwrap_or(defaults.max_content_length),
            requests_per_minute: parsed(ENV_REQUESTS_PER_MINUTE)?
                .unwrap_or(defaults.requests_per_minute),
            cleanup_interval: parsed(ENV_CLEANUP_INTERVAL_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            cache_ttl: parsed(ENV_CACHE_TTL_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            base_url: non_empty(ENV_BASE_URL).unwrap_or(defaults.base_url),
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_requests_per_minute(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Per-request HTTP timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
    pub fn snippet_size(&self) -> usize {
        self.snippet_size
    }
    pub fn summaries_enabled(&self) -> bool {
        !self.disable_summaries
    }
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
    pub fn model(&self) -> &str {
        &self.model
    }
    /// Root of the OpenAI-compatible API, without the `/v1` path.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            timeout: self.timeout,
            snippet_size: self.snippet_size,
        }
    }

    pub fn summary_config(&self) -> SummaryConfig {
        SummaryConfig {
            enabled: !self.disable_summaries,
            api_key: self.api_key.clone(),
            prompt: self.prompt.clone(),
            max_content_length: self.max_content_length,
            requests_per_minute: self.requests_per_minute,
            cache_ttl: self.cache_ttl,
            cleanup_interval: self.cleanup_interval,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                field: key,
                reason: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
