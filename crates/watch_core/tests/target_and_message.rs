use pretty_assertions::assert_eq;
use watch_core::{format_listing_message, ListingRecord, QueryTarget, TargetError};

#[test]
fn origin_drops_path_and_query() {
    let target = QueryTarget::parse("https://www.olx.ua/uk/list/q-playstation-tv/?page=2#top").unwrap();
    assert_eq!(target.origin().as_str(), "https://www.olx.ua/");
    assert_eq!(
        target.as_str(),
        "https://www.olx.ua/uk/list/q-playstation-tv/?page=2#top"
    );
}

#[test]
fn origin_keeps_port() {
    let target = QueryTarget::parse("http://127.0.0.1:8080/list/").unwrap();
    assert_eq!(target.origin().as_str(), "http://127.0.0.1:8080/");
}

#[test]
fn relative_or_non_http_targets_are_rejected() {
    assert!(matches!(
        QueryTarget::parse("/uk/list/"),
        Err(TargetError::InvalidUrl { .. })
    ));
    assert_eq!(
        QueryTarget::parse("ftp://example.com/list"),
        Err(TargetError::UnsupportedScheme("ftp://example.com/list".to_string()))
    );
}

#[test]
fn message_embeds_title_price_and_url() {
    let record = ListingRecord {
        id: "123".to_string(),
        title: "PlayStation TV".to_string(),
        price: "1 500 грн.".to_string(),
        url: "https://www.olx.ua/d/uk/obyavlenie/ps-tv.html".to_string(),
    };
    assert_eq!(
        format_listing_message(&record),
        "📢 *PlayStation TV*\n💰 1 500 грн.\n🔗 https://www.olx.ua/d/uk/obyavlenie/ps-tv.html"
    );
}
