use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("summary generation is disabled")]
    Disabled,

    #[error("API key for summarization is not set")]
    KeyNotSet,

    #[error("summary request cancelled")]
    Cancelled,

    #[error("failed to generate summary")]
    Backend(#[from] BackendError),
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("backend returned no choices")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("summary store unavailable: {0}")]
    Unavailable(String),
}
