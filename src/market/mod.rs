// src/market/mod.rs
//! Quote service: one upstream chart call per symbol, fanned out for
//! indices and gainer/loser lists, with pseudo-random fallbacks.

pub mod mock;
pub mod types;
pub mod yahoo;

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::config::MarketConfig;
use crate::fetched::Fetched;
use crate::http::HttpFetch;
use crate::market::types::{IndexSpec, MarketIndex, MarketSummary, Quote};

/// Rows per list in the market summary.
pub const SUMMARY_ROWS: usize = 5;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "quote_upstream_errors_total",
            "Quote fetches that failed (transport or payload)."
        );
        describe_counter!(
            "quote_fallback_total",
            "Quotes answered with mock data."
        );
    });
}

pub struct MarketService {
    fetcher: Arc<dyn HttpFetch>,
    chart_base_url: String,
    indices: Vec<IndexSpec>,
    watchlist: Vec<String>,
    mock_fallback: bool,
}

impl MarketService {
    pub fn new(fetcher: Arc<dyn HttpFetch>, cfg: &MarketConfig) -> Self {
        Self {
            fetcher,
            chart_base_url: cfg.chart_base_url.trim_end_matches('/').to_string(),
            indices: cfg.indices.clone(),
            watchlist: cfg.watchlist.clone(),
            mock_fallback: cfg.mock_fallback,
        }
    }

    pub fn chart_url(&self, symbol: &str) -> String {
        format!("{}/{}", self.chart_base_url, symbol)
    }

    async fn fetch_live(&self, symbol: &str) -> Result<Quote> {
        let body = self.fetcher.get_text(&self.chart_url(symbol)).await?;
        let chart = yahoo::parse_chart(&body)?;
        yahoo::derive_quote(symbol, &chart, Utc::now())
    }

    /// Quote for one symbol. Any failure yields a mock quote (`Degraded`)
    /// unless fallback is disabled.
    pub async fn quote(&self, symbol: &str) -> Fetched<Quote> {
        ensure_metrics_described();
        match self.fetch_live(symbol).await {
            Ok(q) => Fetched::Live(q),
            Err(e) => {
                counter!("quote_upstream_errors_total").increment(1);
                tracing::warn!(target: "market", %symbol, error = ?e, "quote fetch failed");
                let reason = format!("quote for {symbol} unavailable: {e:#}");
                if !self.mock_fallback {
                    return Fetched::Failed(reason);
                }
                counter!("quote_fallback_total").increment(1);
                Fetched::degraded(mock::mock_quote(symbol, Utc::now()), reason)
            }
        }
    }

    pub async fn indices(&self) -> Fetched<Vec<MarketIndex>> {
        let parts = join_all(self.indices.iter().map(|idx| async move {
            match self.quote(&idx.symbol).await {
                Fetched::Live(q) => Fetched::Live(MarketIndex::from_quote(&idx.name, &idx.symbol, &q)),
                Fetched::Degraded { reason, .. } => Fetched::degraded(
                    mock::mock_index(&idx.symbol, &idx.name, Utc::now()),
                    reason,
                ),
                Fetched::Failed(r) => Fetched::Failed(r),
            }
        }))
        .await;
        Fetched::collect(parts)
    }

    async fn watchlist_quotes(&self) -> Fetched<Vec<Quote>> {
        let parts = join_all(self.watchlist.iter().map(|s| self.quote(s))).await;
        Fetched::collect(parts)
    }

    /// Symbols with a positive change, best first.
    pub async fn gainers(&self, limit: usize) -> Fetched<Vec<Quote>> {
        self.watchlist_quotes().await.map(|qs| top_gainers(qs, limit))
    }

    /// Symbols with a negative change, worst first.
    pub async fn losers(&self, limit: usize) -> Fetched<Vec<Quote>> {
        self.watchlist_quotes().await.map(|qs| top_losers(qs, limit))
    }

    pub async fn summary(&self) -> Fetched<MarketSummary> {
        let (indices, quotes) = futures::join!(self.indices(), self.watchlist_quotes());

        let (indices, quotes) = match (indices, quotes) {
            (Fetched::Failed(r), _) | (_, Fetched::Failed(r)) => return Fetched::Failed(r),
            (i, q) => (i, q),
        };
        let degraded_reason = indices
            .reason()
            .or(quotes.reason())
            .map(str::to_string);

        let indices = indices.into_data().unwrap_or_default();
        let quotes = quotes.into_data().unwrap_or_default();

        let mut most_active = quotes.clone();
        most_active.sort_by(|a, b| b.volume.cmp(&a.volume));
        most_active.truncate(SUMMARY_ROWS);

        let summary = MarketSummary {
            timestamp: Utc::now(),
            indices,
            top_gainers: top_gainers(quotes.clone(), SUMMARY_ROWS),
            top_losers: top_losers(quotes, SUMMARY_ROWS),
            most_active,
            currencies: Vec::new(),
            commodities: Vec::new(),
            economic_indicators: Vec::new(),
            news: Vec::new(),
        };
        match degraded_reason {
            Some(r) => Fetched::degraded(summary, r),
            None => Fetched::Live(summary),
        }
    }
}

fn by_change_desc(a: &Quote, b: &Quote) -> Ordering {
    b.change_percent
        .partial_cmp(&a.change_percent)
        .unwrap_or(Ordering::Equal)
}

pub fn top_gainers(quotes: Vec<Quote>, limit: usize) -> Vec<Quote> {
    let mut v: Vec<Quote> = quotes.into_iter().filter(|q| q.change_percent > 0.0).collect();
    v.sort_by(by_change_desc);
    v.truncate(limit);
    v
}

pub fn top_losers(quotes: Vec<Quote>, limit: usize) -> Vec<Quote> {
    let mut v: Vec<Quote> = quotes.into_iter().filter(|q| q.change_percent < 0.0).collect();
    v.sort_by(|a, b| by_change_desc(b, a));
    v.truncate(limit);
    v
}
