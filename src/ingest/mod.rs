// src/ingest/mod.rs
pub mod mock;
pub mod rss;
pub mod types;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::fetched::Fetched;
use crate::http::HttpFetch;
use crate::ingest::rss::FeedParser;
use crate::ingest::types::{Article, SourceSpec};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "news_articles_parsed_total",
            "Articles extracted from feeds."
        );
        describe_counter!(
            "news_source_errors_total",
            "Feed fetch/parse failures."
        );
        describe_counter!(
            "news_fallback_total",
            "Aggregations answered with mock articles."
        );
        describe_histogram!("news_parse_ms", "Feed parse time in milliseconds.");
    });
}

// Entities we decode; anything else is left as-is.
const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&#160;", " "),
    // last, so "&amp;lt;" stays "&lt;"
    ("&amp;", "&"),
];

/// Decode the fixed entity table. Unknown entities pass through untouched.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    ENTITIES
        .iter()
        .fold(s.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Normalize feed text: strip tags, decode entities, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?s)<[^>]*>").unwrap());
    let out = re_tags.replace_all(s, "");

    // 2) Entity decode
    let out = decode_entities(&out);

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Fans out over a fixed set of feeds and merges what comes back.
pub struct Aggregator {
    fetcher: Arc<dyn HttpFetch>,
    parser: FeedParser,
    sources: Vec<SourceSpec>,
    mock_fallback: bool,
}

impl Aggregator {
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        parser: FeedParser,
        sources: Vec<SourceSpec>,
        mock_fallback: bool,
    ) -> Self {
        Self {
            fetcher,
            parser,
            sources,
            mock_fallback,
        }
    }

    async fn fetch_source(
        &self,
        source: &SourceSpec,
        limit: usize,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Article>> {
        let body = self.fetcher.get_text(&source.url).await?;
        self.parser.parse(&body, source, limit, now)
    }

    /// Fetch every source concurrently, newest first, at most `limit` items.
    ///
    /// A failing source contributes nothing. When no source yields a single
    /// article the result is the mock set (`Degraded`), or `Failed` if mock
    /// fallback is disabled.
    pub async fn run(&self, limit: usize) -> Fetched<Vec<Article>> {
        self.run_at(limit, Utc::now()).await
    }

    /// [`Aggregator::run`] with an explicit clock for staleness and ids.
    pub async fn run_at(&self, limit: usize, now: DateTime<Utc>) -> Fetched<Vec<Article>> {
        ensure_metrics_described();

        let results = join_all(
            self.sources
                .iter()
                .map(|src| async move { (src, self.fetch_source(src, limit, now).await) }),
        )
        .await;

        let mut merged = Vec::new();
        let mut failed = 0usize;
        for (src, res) in results {
            match res {
                Ok(mut v) => merged.append(&mut v),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        target: "ingest",
                        error = ?e,
                        source = %src.name,
                        url = %src.url,
                        "news source failed"
                    );
                    counter!("news_source_errors_total").increment(1);
                }
            }
        }

        if merged.is_empty() {
            let reason = if failed == self.sources.len() {
                format!("all {failed} news sources failed")
            } else {
                format!("no fresh articles from {} sources", self.sources.len())
            };
            if !self.mock_fallback {
                return Fetched::Failed(reason);
            }
            counter!("news_fallback_total").increment(1);
            tracing::warn!(target: "ingest", %reason, "serving mock articles");
            return Fetched::degraded(mock::mock_articles(limit, now), reason);
        }

        merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        merged.truncate(limit);

        tracing::info!(
            target: "ingest",
            kept = merged.len(),
            failed_sources = failed,
            "news aggregated"
        );
        Fetched::Live(merged)
    }
}
