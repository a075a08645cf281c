use readability::extractor;
use scraper::{Html, Selector};
use url::Url;

use crate::extractor::{errors::ExtractError, model::Extracted};

/// Heuristic main-content extractor used when no rule applies.
pub trait GenericParser: Send + Sync {
    fn parse(&self, html: &str, url: &Url) -> Result<Extracted, ExtractError>;
}

/// [`GenericParser`] backed by the `readability` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadabilityParser;

impl GenericParser for ReadabilityParser {
    fn parse(&self, html: &str, url: &Url) -> Result<Extracted, ExtractError> {
        let article = extractor::extract(&mut html.as_bytes(), url)
            .map_err(|e| ExtractError::Parser(format!("{e:?}")))?;

        Ok(Extracted {
            text: article.text,
            rich: article.content,
        })
    }
}

/// Page title: `<title>`, then `og:title`, then the first `<h1>`.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    if let Ok(selector) = Selector::parse("title")
        && let Some(title) = first_text(&document, &selector)
    {
        return Some(title);
    }

    if let Ok(selector) = Selector::parse("meta[property='og:title']") {
        for element in document.select(&selector) {
            if let Some(content) = element.value().attr("content")
                && !content.trim().is_empty()
            {
                return Some(content.trim().to_string());
            }
        }
    }

    if let Ok(selector) = Selector::parse("h1") {
        return first_text(&document, &selector);
    }

    None
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).find_map(|element| {
        let text = element.text().collect::<String>().trim().to_string();
        (!text.is_empty()).then_some(text)
    })
}
