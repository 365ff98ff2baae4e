//! News operations exposed to the API: latest, search and category views
//! over the aggregated feeds.

use std::sync::Arc;

use anyhow::Result;

use crate::config::NewsConfig;
use crate::fetched::Fetched;
use crate::http::HttpFetch;
use crate::ingest::rss::FeedParser;
use crate::ingest::types::Article;
use crate::ingest::Aggregator;
use crate::sentiment::{matches_category, resolve_category};

pub struct NewsService {
    aggregator: Aggregator,
    search_window: usize,
}

impl NewsService {
    pub fn new(fetcher: Arc<dyn HttpFetch>, cfg: &NewsConfig) -> Result<Self> {
        let parser = FeedParser::new(&cfg.schema, cfg.staleness_days)?;
        Ok(Self {
            aggregator: Aggregator::new(fetcher, parser, cfg.sources.clone(), cfg.mock_fallback),
            search_window: cfg.search_window,
        })
    }

    pub async fn latest(&self, limit: usize) -> Fetched<Vec<Article>> {
        self.aggregator.run(limit).await
    }

    /// Case-insensitive substring match on title or summary over the most
    /// recent `search_window` articles.
    pub async fn search(&self, query: &str, limit: usize) -> Fetched<Vec<Article>> {
        let needle = query.trim().to_lowercase();
        tracing::info!(target: "news", query = %needle, limit, "news search");
        self.aggregator
            .run(self.search_window)
            .await
            .map(|all| {
                all.into_iter()
                    .filter(|a| {
                        a.title.to_lowercase().contains(&needle)
                            || a.summary.to_lowercase().contains(&needle)
                    })
                    .take(limit)
                    .collect()
            })
    }

    /// Articles matching the category keyword set; unknown categories use
    /// the `business` set.
    pub async fn by_category(&self, category: &str, limit: usize) -> Fetched<Vec<Article>> {
        let resolved = resolve_category(category);
        tracing::info!(target: "news", requested = %category, %resolved, limit, "news by category");
        self.aggregator
            .run(self.search_window)
            .await
            .map(|all| {
                all.into_iter()
                    .filter(|a| matches_category(resolved, &a.title, &a.summary))
                    .take(limit)
                    .collect()
            })
    }
}
