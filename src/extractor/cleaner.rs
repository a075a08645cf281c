use ammonia::Builder;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(href|src|action|background)="([^"]*)""#).unwrap());

/// Removes scripts, styles, event handlers and other unsafe markup.
pub fn sanitize(html: &str) -> String {
    Builder::default().clean(html).to_string()
}

/// Rewrites every quoted `href`, `src`, `action` and `background` value to an
/// absolute url resolved against `base_url`.
///
/// Returns the rewritten fragment and every link found, in document order and
/// with duplicates. Values that do not resolve are kept as written.
pub fn absolutize(html: &str, base_url: &Url) -> (String, Vec<String>) {
    let mut links = Vec::new();
    let mut normalized = 0usize;

    let rewritten = LINK_REGEX.replace_all(html, |caps: &Captures| {
        let link = &caps[2];
        match base_url.join(link) {
            Ok(absolute) if absolute.as_str() != link => {
                normalized += 1;
                links.push(absolute.to_string());
                format!(r#"{}="{}""#, &caps[1], absolute)
            }
            _ => {
                links.push(link.to_string());
                caps[0].to_string()
            }
        }
    });

    debug!(normalized, total = links.len(), "normalized links");
    (rewritten.into_owned(), links)
}
