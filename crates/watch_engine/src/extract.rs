use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;
use watch_core::{KeywordFilter, ListingRecord, PRICE_UNAVAILABLE};
use watch_logging::{watch_debug, watch_trace};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Marker selectors locating each role inside the results markup.
///
/// Defaults follow the marketplace's `data-cy` / `data-testid` test attributes,
/// which survive restyling far better than class names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardMarkers {
    pub card: String,
    pub title_container: String,
    pub price: String,
    /// Heading tags tried in order inside the title container.
    pub structured_headings: Vec<String>,
    /// Heading selector used when the title container is missing.
    pub fallback_headings: String,
    /// Relative link prefixes that identify an ad detail page.
    pub detail_path_prefixes: Vec<String>,
}

impl Default for CardMarkers {
    fn default() -> Self {
        Self {
            card: "div[data-cy='l-card']".to_string(),
            title_container: "div[data-cy='ad-card-title']".to_string(),
            price: "p[data-testid='ad-price']".to_string(),
            structured_headings: vec!["h4".to_string(), "h3".to_string()],
            fallback_headings: "h4, h3, h6".to_string(),
            detail_path_prefixes: vec!["/d/".to_string()],
        }
    }
}

/// Turns a results page into listing records.
#[derive(Debug)]
pub struct ListingExtractor {
    card: Selector,
    title_container: Selector,
    price: Selector,
    structured_headings: Vec<Selector>,
    fallback_headings: Selector,
    link: Selector,
    paragraph: Selector,
    detail_path_prefixes: Vec<String>,
}

struct CardParts<'a> {
    heading: ElementRef<'a>,
    href: String,
    url: Url,
    price: Option<ElementRef<'a>>,
}

impl ListingExtractor {
    pub fn new(markers: &CardMarkers) -> Result<Self, ExtractError> {
        Ok(Self {
            card: compile(&markers.card)?,
            title_container: compile(&markers.title_container)?,
            price: compile(&markers.price)?,
            structured_headings: markers
                .structured_headings
                .iter()
                .map(|s| compile(s))
                .collect::<Result<_, _>>()?,
            fallback_headings: compile(&markers.fallback_headings)?,
            link: compile("a[href]")?,
            paragraph: compile("p")?,
            detail_path_prefixes: markers.detail_path_prefixes.clone(),
        })
    }

    /// Extracts every card that has both a heading and a resolvable link and
    /// whose title passes `filter`, in document order. Relative links are
    /// resolved against `base_url`.
    pub fn extract(&self, html: &str, base_url: &Url, filter: &KeywordFilter) -> Vec<ListingRecord> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();

        for card in document.select(&self.card) {
            let Some(parts) = self.card_parts(card, base_url) else {
                watch_trace!("Skipped card without title or link");
                continue;
            };

            let title = element_text(parts.heading);
            let missing = filter.missing(&title);
            if !missing.is_empty() {
                watch_debug!("Skipped ad missing keywords {:?}: {}", missing, title);
                continue;
            }

            let id = card
                .value()
                .attr("id")
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ToOwned::to_owned)
                .unwrap_or(parts.href);
            let price = parts
                .price
                .map(element_text)
                .unwrap_or_else(|| PRICE_UNAVAILABLE.to_string());

            records.push(ListingRecord {
                id,
                title,
                price,
                url: parts.url.into(),
            });
        }

        records
    }

    fn card_parts<'a>(&self, card: ElementRef<'a>, base_url: &Url) -> Option<CardParts<'a>> {
        match card.select(&self.title_container).next() {
            Some(container) => self.structured_parts(card, container, base_url),
            None => self.fallback_parts(card, base_url),
        }
    }

    fn structured_parts<'a>(
        &self,
        card: ElementRef<'a>,
        container: ElementRef<'a>,
        base_url: &Url,
    ) -> Option<CardParts<'a>> {
        let heading = self
            .structured_headings
            .iter()
            .find_map(|sel| container.select(sel).next())?;
        let (href, url) = container
            .select(&self.link)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| resolve(href, base_url).map(|url| (href.trim().to_string(), url)))?;
        let price = card.select(&self.price).next();
        Some(CardParts {
            heading,
            href,
            url,
            price,
        })
    }

    fn fallback_parts<'a>(&self, card: ElementRef<'a>, base_url: &Url) -> Option<CardParts<'a>> {
        let heading = card.select(&self.fallback_headings).next()?;
        let href = card
            .select(&self.link)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|href| self.looks_like_detail_link(href))?;
        let url = resolve(href, base_url)?;
        let price = card
            .select(&self.price)
            .next()
            .or_else(|| card.select(&self.paragraph).next());
        Some(CardParts {
            heading,
            href: href.to_string(),
            url,
            price,
        })
    }

    fn looks_like_detail_link(&self, href: &str) -> bool {
        href.starts_with("http")
            || self
                .detail_path_prefixes
                .iter()
                .any(|prefix| href.starts_with(prefix.as_str()))
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|err| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

/// Text fragments trimmed individually and joined without separators.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

fn resolve(href: &str, base: &Url) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") || lower.starts_with("mailto:") {
        return None;
    }
    let url = base.join(trimmed).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
