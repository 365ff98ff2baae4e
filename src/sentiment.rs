//! Keyword heuristics over article text: three-way sentiment, vocabulary
//! tags and category membership.
//!
//! Every check is a plain substring test on the lower-cased text, not a
//! word-boundary match, so "aud" is found inside "fraud".

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

use crate::ingest::types::Sentiment;

const POSITIVE: &[&str] = &[
    "gain", "rise", "up", "positive", "growth", "profit", "surge", "rally", "boost", "strong",
];
const NEGATIVE: &[&str] = &[
    "fall", "drop", "down", "negative", "loss", "decline", "crash", "plunge", "weak", "concern",
];

const COMPANIES: &[&str] = &[
    "apple", "microsoft", "google", "amazon", "tesla", "meta", "netflix", "nvidia", "amd", "intel",
];
const INDICES: &[&str] = &["s&p 500", "nasdaq", "dow jones", "asx 200", "ftse 100"];
const CURRENCIES: &[&str] = &["usd", "eur", "gbp", "jpy", "aud", "cad"];

/// Category used when a caller asks for one we do not know.
pub const DEFAULT_CATEGORY: &str = "business";

static CATEGORIES: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert(
        "business",
        &[
            "business", "company", "companies", "earnings", "revenue", "profit", "merger",
            "acquisition", "deal", "ceo", "market",
        ],
    );
    m.insert(
        "technology",
        &[
            "tech", "software", "chip", "semiconductor", "artificial intelligence", "cloud",
            "apple", "microsoft", "google", "nvidia",
        ],
    );
    m.insert(
        "markets",
        &[
            "stock", "shares", "index", "s&p 500", "nasdaq", "dow jones", "bond", "yield",
            "trading", "investor",
        ],
    );
    m.insert(
        "economy",
        &[
            "economy", "economic", "inflation", "gdp", "interest rate", "federal reserve",
            "central bank", "jobs", "unemployment", "recession",
        ],
    );
    m
});

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Majority vote of positive vs. negative keyword hits over
    /// `title + " " + summary`; ties are neutral.
    pub fn classify(&self, title: &str, summary: &str) -> Sentiment {
        let text = joined_lower(title, summary);
        let pos = count_hits(&text, POSITIVE);
        let neg = count_hits(&text, NEGATIVE);
        match pos.cmp(&neg) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }

    /// Union of the company, index and currency keywords found in the text.
    pub fn tags(&self, title: &str, summary: &str) -> BTreeSet<String> {
        let text = joined_lower(title, summary);
        COMPANIES
            .iter()
            .chain(INDICES)
            .chain(CURRENCIES)
            .filter(|kw| text.contains(*kw))
            .map(|kw| kw.to_string())
            .collect()
    }
}

/// Map a requested category onto a known one (`business` for anything else).
pub fn resolve_category(category: &str) -> &'static str {
    let c = category.trim().to_ascii_lowercase();
    CATEGORIES
        .get_key_value(c.as_str())
        .map(|(k, _)| *k)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// True when the text contains any keyword of the (resolved) category.
pub fn matches_category(category: &str, title: &str, summary: &str) -> bool {
    let text = joined_lower(title, summary);
    CATEGORIES
        .get(resolve_category(category))
        .is_some_and(|kws| kws.iter().any(|kw| text.contains(kw)))
}

fn joined_lower(title: &str, summary: &str) -> String {
    format!("{title} {summary}").to_lowercase()
}

fn count_hits(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| text.contains(*w)).count()
}
