// src/ingest/mock.rs
//! Static articles served when no feed produced anything.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::ingest::types::{Article, Sentiment};

fn tags(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|t| t.to_string()).collect()
}

/// The fixed fallback set, newest first, truncated to `limit`.
pub fn mock_articles(limit: usize, now: DateTime<Utc>) -> Vec<Article> {
    let all = vec![
        Article {
            id: "mock-1".into(),
            title: "Markets Rally on Positive Economic Data".into(),
            summary: "Global markets showed strong gains today following better-than-expected economic indicators.".into(),
            content: "Global markets showed strong gains today following better-than-expected economic indicators. The S&P 500 rose 1.2% while the NASDAQ gained 1.8%.".into(),
            url: "https://example.com/news/1".into(),
            source: "Reuters".into(),
            published_at: now,
            tags: tags(&["markets", "s&p 500", "nasdaq"]),
            sentiment: Sentiment::Positive,
            author: Some("Financial Reporter".into()),
        },
        Article {
            id: "mock-2".into(),
            title: "Tech Stocks Face Pressure from Regulatory Concerns".into(),
            summary: "Technology companies saw mixed trading as investors weighed regulatory risks.".into(),
            content: "Technology companies saw mixed trading as investors weighed regulatory risks. Apple and Microsoft were among the most active stocks.".into(),
            url: "https://example.com/news/2".into(),
            source: "Reuters".into(),
            published_at: now - Duration::hours(1),
            tags: tags(&["technology", "apple", "microsoft"]),
            sentiment: Sentiment::Neutral,
            author: Some("Tech Reporter".into()),
        },
        Article {
            id: "mock-3".into(),
            title: "Federal Reserve Signals Potential Rate Changes".into(),
            summary: "The Federal Reserve indicated possible adjustments to interest rates in upcoming meetings.".into(),
            content: "The Federal Reserve indicated possible adjustments to interest rates in upcoming meetings, causing volatility in bond markets.".into(),
            url: "https://example.com/news/3".into(),
            source: "Reuters".into(),
            published_at: now - Duration::hours(2),
            tags: tags(&["federal reserve", "interest rates"]),
            sentiment: Sentiment::Neutral,
            author: Some("Economic Reporter".into()),
        },
    ];
    all.into_iter().take(limit).collect()
}
