// src/ingest/types.rs
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::rss::ExtractionSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// A normalized news item. Built once by the parser (or the mock table) and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String, // "{source-slug}-{index}-{unix_ms}"
    pub title: String,
    pub summary: String,
    pub content: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub sentiment: Sentiment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// One configured RSS feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSpec {
    /// Written into `Article::source` for every item of this feed.
    pub name: String,
    pub url: String,
    /// Tags injected into every article of this feed.
    #[serde(default)]
    pub extra_tags: Vec<String>,
    /// Per-feed override of the shared extraction schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ExtractionSchema>,
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            extra_tags: Vec::new(),
            schema: None,
        }
    }

    /// Lower-case, dash-separated form of the name, used in article ids.
    pub fn slug(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        for ch in self.name.chars() {
            if ch.is_ascii_alphanumeric() {
                out.push(ch.to_ascii_lowercase());
            } else if !out.ends_with('-') {
                out.push('-');
            }
        }
        out.trim_matches('-').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(SourceSpec::new("Reuters Business", "u").slug(), "reuters-business");
        assert_eq!(SourceSpec::new("  CNBC / Top ", "u").slug(), "cnbc-top");
    }

    #[test]
    fn sentiment_serializes_lowercase() {
        let s = serde_json::to_string(&Sentiment::Positive).unwrap();
        assert_eq!(s, "\"positive\"");
    }
}
