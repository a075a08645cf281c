use crate::fetcher::{encoding::process_response, errors::FetchError, types::PageResponse};
use reqwest::{
    Client, ClientBuilder,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};
use url::Url;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sites serve readable markup to browsers, so requests present themselves as one.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.4 Safari/605.1.15";

/// HTTP fetcher shared by page downloads and image probes.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Builds a fetcher whose every request is bounded by `timeout`.
    ///
    /// Idle connections are not kept around; each request stands on its own.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = ClientBuilder::new()
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .pool_max_idle_per_host(0)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// GETs `url`, following redirects, and decodes the body to UTF-8.
    ///
    /// A non-2xx status is not an error: whatever body came back is still
    /// returned for parsing.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<PageResponse, FetchError> {
        let parsed_url = Url::parse(url)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            res = self.fetch_page(parsed_url) => res,
        }
    }

    /// Downloads `url` completely and returns the body length in bytes.
    pub async fn probe_size(&self, cancel: &CancellationToken, url: &Url) -> Result<usize, FetchError> {
        let download = async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(FetchError::from_reqwest_error)?;
            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::Io(e.to_string()))?;
            Ok::<_, FetchError>(body.len())
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            res = download => res,
        }
    }

    async fn fetch_page(&self, url: Url) -> Result<PageResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            warn!(%status, "non-success status, parsing body anyway");
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        // Check body size after download (in case Content-Length was missing)
        if body_bytes.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        Ok(process_response(final_url, status, headers, body_bytes))
    }
}
