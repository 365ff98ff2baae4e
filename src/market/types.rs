// src/market/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::types::Article;

/// Point-in-time price snapshot for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub previous_close: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    pub name: String,
    pub symbol: String,
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
    pub timestamp: DateTime<Utc>,
}

impl MarketIndex {
    pub fn from_quote(name: &str, symbol: &str, q: &Quote) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            value: q.price,
            change: q.change,
            change_percent: q.change_percent,
            timestamp: q.timestamp,
        }
    }
}

/// Configured index to track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexSpec {
    pub symbol: String,
    pub name: String,
}

impl IndexSpec {
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub timestamp: DateTime<Utc>,
    pub indices: Vec<MarketIndex>,
    pub top_gainers: Vec<Quote>,
    pub top_losers: Vec<Quote>,
    pub most_active: Vec<Quote>,
    // Always empty for now; kept so clients see a stable shape.
    pub currencies: Vec<serde_json::Value>,
    pub commodities: Vec<serde_json::Value>,
    pub economic_indicators: Vec<serde_json::Value>,
    pub news: Vec<Article>,
}
