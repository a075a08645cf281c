use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::extractor::{
    errors::ExtractError,
    model::Extracted,
    rules::{ExtractionRule, RuleStore},
    text,
};

/// How the article body of one request is going to be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Apply `rule`; when `fallback` is set a failed rule hands over to the
    /// generic extractor.
    UseRule { rule: ExtractionRule, fallback: bool },
    UseGeneric,
}

impl Strategy {
    /// A caller-supplied rule always wins and is never second-guessed. Otherwise
    /// the store is asked for the host's rule.
    pub async fn decide(
        explicit: Option<&ExtractionRule>,
        rules: Option<&dyn RuleStore>,
        host: &str,
    ) -> Self {
        if let Some(rule) = explicit {
            debug!(domain = %rule.domain, "custom rule provided");
            return Self::UseRule {
                rule: rule.clone(),
                fallback: false,
            };
        }

        let Some(rules) = rules else {
            debug!("no rule store configured");
            return Self::UseGeneric;
        };

        match rules.get(host).await {
            Some(rule) => {
                debug!(domain = %rule.domain, selector = %rule.selector, "found rule");
                Self::UseRule {
                    rule,
                    fallback: true,
                }
            }
            None => {
                debug!(host, "no custom rule");
                Self::UseGeneric
            }
        }
    }
}

/// Inner HTML of every node matching the rule's selector, in document order,
/// minus anything matching one of its excludes.
pub fn extract_by_rule(body: &str, rule: &ExtractionRule) -> Result<Extracted, ExtractError> {
    let selector = parse_selector(&rule.selector)?;
    let document = Html::parse_document(body);

    let mut rich: String = document
        .select(&selector)
        .map(|element| element.inner_html())
        .collect();

    if !rule.excludes.is_empty() && !rich.is_empty() {
        rich = remove_excluded(&rich, &rule.excludes);
    }

    if rich.is_empty() {
        return Err(ExtractError::RuleMatchedNothing {
            domain: rule.domain.clone(),
            selector: rule.selector.clone(),
        });
    }

    Ok(Extracted {
        text: text::clean(&rich, ""),
        rich,
    })
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn remove_excluded(fragment: &str, excludes: &[String]) -> String {
    let mut html = Html::parse_fragment(fragment);

    let mut doomed = Vec::new();
    for exclude in excludes {
        match parse_selector(exclude) {
            Ok(selector) => doomed.extend(html.select(&selector).map(|element| element.id())),
            Err(e) => warn!(error = %e, "skipping exclude"),
        }
    }

    for id in doomed {
        if let Some(mut node) = html.tree.get_mut(id) {
            node.detach();
        }
    }

    html.root_element().inner_html()
}
