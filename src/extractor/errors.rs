use thiserror::Error;

use crate::fetcher::FetchError;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("fetch failed")]
    Fetch(#[from] FetchError),

    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("nothing extracted with rule for {domain} ({selector})")]
    RuleMatchedNothing { domain: String, selector: String },

    #[error("generic parser failed: {0}")]
    Parser(String),

    #[error("no content extracted from {0}")]
    NothingExtracted(String),
}

impl ExtractError {
    /// Failures local to a rule; the generic extractor may still succeed.
    pub fn is_rule_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidSelector { .. } | Self::RuleMatchedNothing { .. }
        )
    }
}
