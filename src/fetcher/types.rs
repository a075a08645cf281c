use reqwest::{StatusCode, header::HeaderMap};
use url::Url;

pub const DEFAULT_CONTENT_TYPE: &str = "text/html";
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Result of charset detection over a raw page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub content_type: String,
    /// Charset label as declared by the page, lowercased.
    pub charset: String,
    pub text: String,
}

#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body_utf8: String,
    pub content_type: String,
    pub charset: String,
}

impl PageResponse {
    /// Host component of the final url, empty for host-less urls.
    pub fn domain(&self) -> &str {
        self.url_final.host_str().unwrap_or_default()
    }
}
