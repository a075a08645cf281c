use scraper::{Html, Selector};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::fetcher::Fetcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadImage {
    pub image: String,
    /// Every candidate, sorted.
    pub all_images: Vec<String>,
}

/// `src` of every `<img>` in the fragment, in document order.
pub fn image_sources(rich: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(rich);
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };

    fragment
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .map(str::to_string)
        .collect()
}

/// Downloads every candidate image concurrently and picks the largest one.
///
/// A failed probe counts as size 0. Returns `None` when the fragment has no
/// images.
pub async fn select_lead_image(
    fetcher: &Fetcher,
    cancel: &CancellationToken,
    rich: &str,
    page_url: &Url,
) -> Option<LeadImage> {
    let candidates = image_sources(rich);
    if candidates.is_empty() {
        return None;
    }

    // Dropping the set aborts probes still in flight.
    let mut probes = JoinSet::new();
    for (slot, src) in candidates.iter().enumerate() {
        let fetcher = fetcher.clone();
        let cancel = cancel.clone();
        let target = page_url.join(src);
        let src = src.clone();
        probes.spawn(async move {
            let url = match target {
                Ok(url) => url,
                Err(e) => {
                    warn!(%src, error = %e, "can't resolve image url");
                    return (slot, 0);
                }
            };
            match fetcher.probe_size(&cancel, &url).await {
                Ok(size) => (slot, size),
                Err(e) => {
                    warn!(%url, error = %e, "can't get image");
                    (slot, 0)
                }
            }
        });
    }

    let mut sizes = vec![0usize; candidates.len()];
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok((slot, size)) => sizes[slot] = size,
            Err(e) => warn!(error = %e, "image probe task failed"),
        }
    }

    let lead = pick_largest(&candidates, &sizes)?;
    debug!(
        total = candidates.len(),
        main = %lead.image,
        "selected lead image for {page_url}"
    );
    Some(lead)
}

/// Largest candidate by measured size; the first one wins a tie.
pub fn pick_largest(candidates: &[String], sizes: &[usize]) -> Option<LeadImage> {
    let mut best: Option<(usize, &String)> = None;
    for (src, &size) in candidates.iter().zip(sizes) {
        if best.is_none_or(|(best_size, _)| size > best_size) {
            best = Some((size, src));
        }
    }

    let (_, image) = best?;
    let mut all_images = candidates.to_vec();
    all_images.sort();

    Some(LeadImage {
        image: image.clone(),
        all_images,
    })
}
