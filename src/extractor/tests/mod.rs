use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use url::Url;

use crate::extractor::{
    ExtractError, Extracted, ExtractionRule, Extractor, ExtractorConfig, GenericParser,
    MemoryRuleStore, Strategy,
};
use crate::fetcher::types::PageResponse;

const ARTICLE: &str = r#"<!DOCTYPE html><html><head><title>Sample Article</title></head><body>
    <nav><a href="/">Home</a></nav>
    <div class="story"><p>Custom rule body.</p></div>
</body></html>"#;

struct StubParser(Extracted);

impl GenericParser for StubParser {
    fn parse(&self, _html: &str, _url: &Url) -> Result<Extracted, ExtractError> {
        Ok(self.0.clone())
    }
}

fn create_test_response(html: &str, url: &str) -> PageResponse {
    PageResponse {
        url_final: Url::parse(url).unwrap(),
        status: StatusCode::OK,
        headers: HeaderMap::new(),
        body_utf8: html.to_string(),
        content_type: "text/html".to_string(),
        charset: "utf-8".to_string(),
    }
}

fn stub_extractor(extracted: Extracted) -> Extractor {
    Extractor::new(&ExtractorConfig::default())
        .unwrap()
        .with_parser(Arc::new(StubParser(extracted)))
}

fn generic_body() -> Extracted {
    Extracted {
        text: "Generic body text.".to_string(),
        rich: "<p>Generic body text.</p>".to_string(),
    }
}

#[tokio::test]
async fn test_stored_rule_is_applied() {
    let store = Arc::new(MemoryRuleStore::new());
    store.insert(ExtractionRule::new("example.com", ".story"));
    let extractor = stub_extractor(generic_body()).with_rules(store.clone());
    let page = create_test_response(ARTICLE, "https://example.com/post");

    let strategy = Strategy::decide(None, Some(store.as_ref()), page.domain()).await;
    let extracted = extractor.run(strategy, &page).unwrap();

    assert_eq!(extracted.rich, "<p>Custom rule body.</p>");
    assert_eq!(extracted.text, "Custom rule body.");
}

#[tokio::test]
async fn test_failed_stored_rule_matches_generic_output() {
    let store = Arc::new(MemoryRuleStore::new());
    store.insert(ExtractionRule::new("example.com", ".missing"));
    let extractor = stub_extractor(generic_body());
    let page = create_test_response(ARTICLE, "https://example.com/post");

    let with_rule = Strategy::decide(None, Some(store.as_ref()), page.domain()).await;
    let fallback = extractor.run(with_rule, &page).unwrap();
    let generic = extractor.run(Strategy::UseGeneric, &page).unwrap();

    assert_eq!(fallback, generic);
    assert_eq!(fallback, generic_body());
}

#[tokio::test]
async fn test_forced_rule_failure_is_terminal() {
    let extractor = stub_extractor(generic_body());
    let page = create_test_response(ARTICLE, "https://example.com/post");
    let forced = ExtractionRule::new("example.com", ".missing");

    let strategy = Strategy::decide(Some(&forced), None, page.domain()).await;
    let err = extractor.run(strategy, &page).unwrap_err();

    assert!(matches!(err, ExtractError::RuleMatchedNothing { .. }));
}

#[test]
fn test_empty_generic_result_is_an_error() {
    let extractor = stub_extractor(Extracted::default());
    let page = create_test_response("<html><body></body></html>", "https://example.com/empty");

    let err = extractor.run(Strategy::UseGeneric, &page).unwrap_err();
    assert!(matches!(err, ExtractError::NothingExtracted(_)));
}

#[test]
fn test_malformed_html_with_rule() {
    let html = "<html><head><title>Broken</title><body><div class=\"story\"><p>Unclosed tags<div>More content";
    let extractor = stub_extractor(generic_body());
    let page = create_test_response(html, "https://example.com/broken");
    let strategy = Strategy::UseRule {
        rule: ExtractionRule::new("example.com", ".story"),
        fallback: false,
    };

    let extracted = extractor.run(strategy, &page).unwrap();
    assert!(extracted.text.contains("Unclosed tags"));
    assert!(extracted.text.contains("More content"));
}
