use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use ureadable::extractor::{
    ExtractError, Extracted, ExtractionRule, Extractor, ExtractorConfig, GenericParser,
    MemoryRuleStore,
};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Test Article</title></head>
<body>
  <nav><a href="/home">Home</a></nav>
  <article>
    <h2>Test Article</h2>
    <p>First paragraph of the article. It has some content.</p>
    <img src="/img/small.png">
    <img src="/img/big.png">
    <img src="/img/mid.png">
    <p>Read more <a href="/about">about us</a>.</p>
    <div class="ad">Buy now</div>
  </article>
</body>
</html>"#;

struct StubParser;

impl GenericParser for StubParser {
    fn parse(&self, _html: &str, _url: &Url) -> Result<Extracted, ExtractError> {
        Ok(Extracted {
            text: "Generic text of the page.".to_string(),
            rich: "<p>Generic text of the page.</p>".to_string(),
        })
    }
}

async fn mount_site() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html; charset=utf-8"))
        .mount(&mock_server)
        .await;

    for (name, size) in [("small", 10), ("big", 50), ("mid", 30)] {
        Mock::given(method("GET"))
            .and(path(format!("/img/{name}.png")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0u8; size])
                    .insert_header("Content-Type", "image/png"),
            )
            .mount(&mock_server)
            .await;
    }

    mock_server
}

fn extractor_with_rule(rule: ExtractionRule) -> Extractor {
    let rules = Arc::new(MemoryRuleStore::new());
    rules.insert(rule);
    Extractor::new(&ExtractorConfig::default())
        .unwrap()
        .with_rules(rules)
        .with_parser(Arc::new(StubParser))
}

#[tokio::test]
async fn test_rule_extraction_end_to_end() {
    let mock_server = mount_site().await;
    let base = mock_server.uri();
    let extractor = extractor_with_rule(
        ExtractionRule::new("127.0.0.1", "article").with_excludes([".ad"]),
    );

    let url = format!("{base}/post");
    let article = extractor
        .extract(&CancellationToken::new(), &url)
        .await
        .unwrap();

    assert_eq!(article.url, url);
    assert_eq!(article.domain, "127.0.0.1");
    assert_eq!(article.title, "Test Article");
    assert_eq!(article.content_type, "text/html");
    assert_eq!(article.charset, "utf-8");

    // Title text is removed from the body once.
    assert!(!article.content.contains("Test Article"));
    assert!(article.content.contains("First paragraph of the article. It has some content."));
    assert!(!article.content.contains("Buy now"));
    assert!(!article.content.contains("Home"));
    assert!(article.excerpt.len() <= article.content.len());

    assert!(article.rich.contains(&format!(r#"href="{base}/about""#)));
    assert!(article.rich.contains(&format!(r#"src="{base}/img/big.png""#)));
    assert!(article.all_links.contains(&format!("{base}/about")));

    assert_eq!(article.image.as_deref(), Some(format!("{base}/img/big.png").as_str()));
    assert_eq!(
        article.all_images,
        vec![
            format!("{base}/img/big.png"),
            format!("{base}/img/mid.png"),
            format!("{base}/img/small.png"),
        ]
    );
    assert!(article.summary.is_none());
}

#[tokio::test]
async fn test_failing_stored_rule_matches_generic_output() {
    let mock_server = mount_site().await;
    let url = format!("{}/post", mock_server.uri());
    let cancel = CancellationToken::new();

    let with_rule = extractor_with_rule(ExtractionRule::new("127.0.0.1", "div.missing"))
        .extract(&cancel, &url)
        .await
        .unwrap();
    let generic = Extractor::new(&ExtractorConfig::default())
        .unwrap()
        .with_parser(Arc::new(StubParser))
        .extract(&cancel, &url)
        .await
        .unwrap();

    assert_eq!(with_rule, generic);
    assert_eq!(generic.content, "Generic text of the page.");
    assert!(generic.image.is_none());
    assert!(generic.all_images.is_empty());
}

#[tokio::test]
async fn test_explicit_rule_failure_is_returned() {
    let mock_server = mount_site().await;
    let url = format!("{}/post", mock_server.uri());
    let extractor = Extractor::new(&ExtractorConfig::default())
        .unwrap()
        .with_parser(Arc::new(StubParser));
    let rule = ExtractionRule::new("127.0.0.1", "div.missing");

    let err = extractor
        .extract_with_rule(&CancellationToken::new(), &url, Some(&rule))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::RuleMatchedNothing { .. }));
}

#[tokio::test]
async fn test_missing_images_do_not_fail_extraction() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Only Text</title></head><body>
            <article><p>Body with a broken image.</p><img src="/gone.png"></article>
            </body></html>"#,
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    let extractor = extractor_with_rule(ExtractionRule::new("127.0.0.1", "article"));
    let url = format!("{}/post", mock_server.uri());
    let article = extractor
        .extract(&CancellationToken::new(), &url)
        .await
        .unwrap();

    assert_eq!(article.content, "Body with a broken image.");
    // The 404 probe still downloads an empty body, the only candidate wins.
    assert_eq!(article.all_images.len(), 1);
}

#[tokio::test]
async fn test_unreachable_image_counts_as_empty() {
    // Bind and release a port so nothing listens on it.
    let dead = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_url = format!("http://{}/dead.png", dead.local_addr().unwrap());
    drop(dead);

    let mock_server = mount_site().await;
    let live_url = format!("{}/img/big.png", mock_server.uri());
    let page = format!(
        r#"<html><head><title>Two Images</title></head><body>
        <article><p>Body with one unreachable image.</p>
        <img src="{dead_url}"><img src="/img/big.png"></article>
        </body></html>"#
    );
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page, "text/html"))
        .mount(&mock_server)
        .await;

    let extractor = extractor_with_rule(ExtractionRule::new("127.0.0.1", "article"));
    let url = format!("{}/two", mock_server.uri());
    let article = extractor
        .extract(&CancellationToken::new(), &url)
        .await
        .unwrap();

    assert_eq!(article.image.as_deref(), Some(live_url.as_str()));
    let mut expected = vec![dead_url, live_url];
    expected.sort();
    assert_eq!(article.all_images, expected);
}

#[tokio::test]
async fn test_escaped_markup_survives_rule_extraction() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/escaped"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Layout Tips</title></head><body>
            <article><p>Wrap it in a &lt;div&gt; element for layout.</p></article>
            </body></html>"#,
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    let extractor = extractor_with_rule(ExtractionRule::new("127.0.0.1", "article"));
    let url = format!("{}/escaped", mock_server.uri());
    let article = extractor
        .extract(&CancellationToken::new(), &url)
        .await
        .unwrap();

    assert_eq!(article.content, "Wrap it in a <div> element for layout.");
}

struct ComparisonParser;

impl GenericParser for ComparisonParser {
    fn parse(&self, _html: &str, _url: &Url) -> Result<Extracted, ExtractError> {
        Ok(Extracted {
            text: "Compare if a<b and b>c holds in the loop.".to_string(),
            rich: "<p>Compare if a&lt;b and b&gt;c holds in the loop.</p>".to_string(),
        })
    }
}

#[tokio::test]
async fn test_generic_text_is_not_parsed_as_markup() {
    let mock_server = mount_site().await;
    let extractor = Extractor::new(&ExtractorConfig::default())
        .unwrap()
        .with_parser(Arc::new(ComparisonParser));
    let url = format!("{}/post", mock_server.uri());

    let article = extractor
        .extract(&CancellationToken::new(), &url)
        .await
        .unwrap();

    assert_eq!(article.content, "Compare if a<b and b>c holds in the loop.");
}

#[tokio::test]
async fn test_fetch_failure_is_wrapped() {
    let extractor = Extractor::new(&ExtractorConfig::default()).unwrap();
    let err = extractor
        .extract(&CancellationToken::new(), "not a url")
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Fetch(_)));
}

#[tokio::test]
async fn test_json_field_names() {
    let mock_server = mount_site().await;
    let extractor = extractor_with_rule(ExtractionRule::new("127.0.0.1", "article"));
    let url = format!("{}/post", mock_server.uri());
    let article = extractor
        .extract(&CancellationToken::new(), &url)
        .await
        .unwrap();

    let json = serde_json::to_value(&article).unwrap();
    for key in [
        "url",
        "domain",
        "title",
        "excerpt",
        "content",
        "rich_content",
        "links",
        "lead_image_url",
        "images",
        "type",
        "charset",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json.get("summary").is_none());
}
