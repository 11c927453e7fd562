/// Price text used when a card carries no price element.
pub const PRICE_UNAVAILABLE: &str = "N/A";

/// One discovered marketplace ad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    /// Card identifier, or the raw link address when the card has none.
    pub id: String,
    pub title: String,
    pub price: String,
    /// Absolute link to the ad detail page.
    pub url: String,
}

/// Telegram Markdown message announcing a single listing.
pub fn format_listing_message(record: &ListingRecord) -> String {
    format!(
        "📢 *{title}*\n💰 {price}\n🔗 {url}",
        title = record.title,
        price = record.price,
        url = record.url,
    )
}
