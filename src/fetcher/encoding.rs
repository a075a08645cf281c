use crate::fetcher::types::{DEFAULT_CHARSET, DEFAULT_CONTENT_TYPE, Decoded, PageResponse};
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use reqwest::{
    StatusCode,
    header::{CONTENT_TYPE, HeaderMap},
};
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

/// Meta tags are only looked up in the head of the document.
const META_SCAN_LIMIT: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>;]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']([^"'>]+)["']"#).unwrap()
});

pub fn process_response(
    url_final: Url,
    status: StatusCode,
    headers: HeaderMap,
    body_bytes: Bytes,
) -> PageResponse {
    let decoded = detect_and_transcode(&body_bytes, &headers);

    PageResponse {
        url_final,
        status,
        headers,
        body_utf8: decoded.text,
        content_type: decoded.content_type,
        charset: decoded.charset,
    }
}

/// Resolves content type and charset, then converts the body to UTF-8.
///
/// The charset comes from the `Content-Type` header first, then from a
/// `<meta charset>` / `<meta http-equiv="Content-Type">` tag, and defaults to
/// UTF-8. Decoding never fails: unknown labels fall back to a lossy UTF-8 read.
pub fn detect_and_transcode(body_bytes: &[u8], headers: &HeaderMap) -> Decoded {
    let (header_type, header_charset) = headers
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(split_content_type)
        .unwrap_or((None, None));

    let search_bytes = &body_bytes[..body_bytes.len().min(META_SCAN_LIMIT)];
    let search_str = String::from_utf8_lossy(search_bytes);

    let (meta_type, meta_charset) = META_HTTP_EQUIV_REGEX
        .captures(&search_str)
        .and_then(|caps| caps.get(1))
        .map(|m| split_content_type(m.as_str()))
        .unwrap_or((None, None));

    let content_type = header_type
        .or(meta_type)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let charset = header_charset
        .or(meta_charset)
        .or_else(|| {
            META_CHARSET_REGEX
                .captures(&search_str)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_lowercase())
        })
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string());

    let text = decode_to_utf8(body_bytes, &charset);

    Decoded {
        content_type,
        charset,
        text,
    }
}

/// Splits `text/html; charset=windows-1251` into its media type and charset.
fn split_content_type(value: &str) -> (Option<String>, Option<String>) {
    let media_type = value
        .split(';')
        .next()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    let charset = CHARSET_REGEX
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase());

    (media_type, charset)
}

fn decode_to_utf8(body_bytes: &[u8], charset: &str) -> String {
    let Some(encoding) = Encoding::for_label(charset.as_bytes()) else {
        warn!(charset, "unsupported charset, reading body as utf-8");
        return String::from_utf8_lossy(body_bytes).into_owned();
    };

    if encoding == UTF_8 {
        return String::from_utf8_lossy(body_bytes).into_owned();
    }

    debug!(charset, "non utf-8 encoding detected");
    let (decoded, _encoding, had_errors) = encoding.decode(body_bytes);
    if had_errors {
        warn!(
            charset,
            "malformed sequences while decoding with {}",
            encoding.name()
        );
    }

    decoded.into_owned()
}
