// src/market/mock.rs
//! Pseudo-random stand-ins used when the quote upstream is unavailable.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::market::types::{MarketIndex, Quote};

/// Random but internally consistent quote:
/// `previous_close = price - change`, `change_percent = change / previous_close * 100`.
pub fn mock_quote(symbol: &str, now: DateTime<Utc>) -> Quote {
    let mut rng = rand::rng();
    let price: f64 = rng.random_range(50.0..1050.0);
    let change: f64 = rng.random_range(-10.0..10.0);
    let previous_close = price - change;

    Quote {
        symbol: symbol.to_uppercase(),
        price,
        change,
        change_percent: change / previous_close * 100.0,
        volume: rng.random_range(0..10_000_000),
        market_cap: Some(rng.random_range(0.0..1_000_000_000.0f64).floor()),
        high: price + rng.random_range(0.0..10.0),
        low: price - rng.random_range(0.0..10.0),
        open: previous_close,
        previous_close,
        timestamp: now,
    }
}

pub fn mock_index(symbol: &str, name: &str, now: DateTime<Utc>) -> MarketIndex {
    let mut rng = rand::rng();
    let value: f64 = rng.random_range(4_000.0..5_000.0);
    let change: f64 = rng.random_range(-50.0..50.0);
    MarketIndex {
        name: name.to_string(),
        symbol: symbol.to_string(),
        value,
        change,
        change_percent: change / (value - change) * 100.0,
        timestamp: now,
    }
}
