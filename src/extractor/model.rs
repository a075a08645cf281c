use serde::{Deserialize, Serialize};

/// Normalized article produced by one extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleResult {
    /// Final url, after redirects.
    pub url: String,
    pub domain: String,
    pub title: String,
    pub excerpt: String,
    /// Plain text body.
    pub content: String,
    /// Sanitized HTML fragment with absolute links.
    #[serde(rename = "rich_content")]
    pub rich: String,
    /// Every link of the rich fragment, in document order.
    #[serde(rename = "links")]
    pub all_links: Vec<String>,
    #[serde(rename = "lead_image_url", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "images")]
    pub all_images: Vec<String>,
    #[serde(rename = "type")]
    pub content_type: String,
    pub charset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Body as produced by an extraction strategy, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub rich: String,
}
