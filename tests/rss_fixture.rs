// tests/rss_fixture.rs
use chrono::{DateTime, Duration, TimeZone, Utc};
use market_summary_api::ingest::rss::{ExtractionSchema, FeedParser};
use market_summary_api::ingest::types::{Sentiment, SourceSpec};

const FEED_XML: &str = include_str!("fixtures/markets_rss.xml");

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap()
}

fn parse(limit: usize) -> Vec<market_summary_api::ingest::types::Article> {
    let parser = FeedParser::new(&ExtractionSchema::default(), 7).expect("schema compiles");
    parser
        .parse(FEED_XML, &SourceSpec::new("Markets Desk", "https://news.test/rss"), limit, now())
        .expect("fixture parses")
}

#[test]
fn fixture_skips_linkless_and_stale_items() {
    let items = parse(50);
    let titles: Vec<&str> = items.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Apple shares surge on strong iPhone growth",
            "Oil prices plunge on weak demand outlook",
            "Markets trade sideways ahead of earnings",
        ]
    );
}

#[test]
fn every_article_is_within_the_staleness_window() {
    let cutoff = now() - Duration::days(7);
    assert!(parse(50).iter().all(|a| a.published_at >= cutoff));
}

#[test]
fn fields_are_normalized_and_classified() {
    let items = parse(50);
    let apple = &items[0];
    assert_eq!(
        apple.summary,
        "Apple's quarterly profit beat estimates as the Nasdaq rallied."
    );
    assert_eq!(apple.source, "Markets Desk");
    assert_eq!(apple.sentiment, Sentiment::Positive);
    assert!(apple.tags.contains("apple") && apple.tags.contains("nasdaq"));
    assert!(apple.id.starts_with("markets-desk-0-"));

    let oil = &items[1];
    assert_eq!(oil.summary, "Crude futures fell & energy stocks dropped sharply.");
    assert_eq!(oil.sentiment, Sentiment::Negative);

    assert_eq!(items[2].sentiment, Sentiment::Neutral);
}

#[test]
fn limit_applies_in_document_order() {
    let items = parse(1);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url, "https://news.test/apple-surge");
}
