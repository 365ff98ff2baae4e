// src/market/yahoo.rs
//! Yahoo-style chart payload and the quote derived from it.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::market::types::Quote;

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub chart_previous_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteSeries>,
}

// Yahoo pads the intraday series with nulls.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteSeries {
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub open: Vec<Option<f64>>,
}

fn valid(series: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    series.iter().flatten().copied().filter(|v| v.is_finite())
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}

pub fn parse_chart(body: &str) -> Result<ChartEnvelope> {
    Ok(serde_json::from_str(body)?)
}

/// Build a [`Quote`] from the first chart result.
///
/// `change = price - previousClose`, `changePercent = change / previousClose * 100`.
/// High/low come from the intraday series (current price if empty), volume
/// and open from the series' last element. Market cap is a rough
/// `price * volume * 100`, not a shares-outstanding figure.
pub fn derive_quote(symbol: &str, env: &ChartEnvelope, now: DateTime<Utc>) -> Result<Quote> {
    if let Some(err) = &env.chart.error {
        if !err.is_null() {
            bail!("upstream error for {symbol}: {err}");
        }
    }
    let result = env
        .chart
        .result
        .as_ref()
        .and_then(|r| r.first())
        .ok_or_else(|| anyhow!("no data available for symbol: {symbol}"))?;

    let meta = &result.meta;
    let (Some(price), Some(previous_close)) = (
        positive(meta.regular_market_price),
        positive(meta.previous_close).or(positive(meta.chart_previous_close)),
    ) else {
        bail!("missing price data for symbol: {symbol}");
    };

    let change = price - previous_close;
    let change_percent = change / previous_close * 100.0;

    let empty = QuoteSeries::default();
    let series = result.indicators.quote.first().unwrap_or(&empty);

    let last = |s: &[Option<f64>]| s.last().copied().flatten().filter(|v| v.is_finite());
    let volume = last(&series.volume[..]).map(|v| v.max(0.0) as u64).unwrap_or(0);
    let open = last(&series.open[..]).filter(|v| *v != 0.0).unwrap_or(price);
    let high = valid(&series.high).reduce(f64::max).unwrap_or(price);
    let low = valid(&series.low).reduce(f64::min).unwrap_or(price);

    let timestamp = result
        .timestamp
        .last()
        .and_then(|ts| DateTime::from_timestamp(*ts, 0))
        .unwrap_or(now);

    Ok(Quote {
        symbol: symbol.to_uppercase(),
        price,
        change,
        change_percent,
        volume,
        market_cap: Some(price * volume as f64 * 100.0),
        high,
        low,
        open,
        previous_close,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote_of(json: &str) -> Result<Quote> {
        derive_quote("aapl", &parse_chart(json)?, Utc::now())
    }

    #[test]
    fn derives_change_and_percent() {
        let q = quote_of(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":150,"previousClose":145},
                "timestamp":[1760000000,1760000060],
                "indicators":{"quote":[{"volume":[100,2000],"high":[151,null,152.5],
                "low":[149,148.2,null],"open":[146,147]}]}}],"error":null}}"#,
        )
        .unwrap();
        assert_eq!(q.symbol, "AAPL");
        assert!((q.change - 5.0).abs() < 1e-9);
        assert!((q.change_percent - 3.448).abs() < 1e-3);
        assert_eq!(q.volume, 2000);
        assert_eq!(q.open, 147.0);
        assert_eq!(q.high, 152.5);
        assert_eq!(q.low, 148.2);
        assert_eq!(q.market_cap, Some(150.0 * 2000.0 * 100.0));
        assert_eq!(q.timestamp.timestamp(), 1_760_000_060);
    }

    #[test]
    fn empty_series_fall_back_to_price() {
        let q = quote_of(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":10.5,"previousClose":10},
                "indicators":{"quote":[{}]}}]}}"#,
        )
        .unwrap();
        assert_eq!(q.high, 10.5);
        assert_eq!(q.low, 10.5);
        assert_eq!(q.open, 10.5);
        assert_eq!(q.volume, 0);
    }

    #[test]
    fn chart_previous_close_stands_in_for_previous_close() {
        let q = quote_of(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":102,"chartPreviousClose":100}}]}}"#,
        )
        .unwrap();
        assert_eq!(q.previous_close, 100.0);
        assert!((q.change - 2.0).abs() < 1e-9);
        assert!((q.change_percent - 2.0).abs() < 1e-9);

        // a zero previousClose counts as missing
        let q = quote_of(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":102,"previousClose":0,"chartPreviousClose":100}}]}}"#,
        )
        .unwrap();
        assert_eq!(q.previous_close, 100.0);

        assert!(quote_of(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":102,"previousClose":0}}]}}"#
        )
        .is_err());
    }

    #[test]
    fn missing_price_fields_are_an_error() {
        assert!(quote_of(r#"{"chart":{"result":[{"meta":{"previousClose":10}}]}}"#).is_err());
        assert!(quote_of(r#"{"chart":{"result":[]}}"#).is_err());
        assert!(quote_of(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#
        )
        .is_err());
    }
}
