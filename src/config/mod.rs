// src/config/mod.rs
//! Application configuration: every outbound endpoint, timeout and feed
//! list lives here and is handed to the services explicitly.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::rss::ExtractionSchema;
use crate::ingest::types::SourceSpec;
use crate::market::types::IndexSpec;

pub const ENV_CONFIG_PATH: &str = "MARKET_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

const ENV_NEWS_TIMEOUT_MS: &str = "NEWS_TIMEOUT_MS";
const ENV_CHART_BASE_URL: &str = "MARKET_CHART_BASE_URL";
const ENV_API_PREFIX: &str = "API_PREFIX";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub news: NewsConfig,
    pub market: MarketConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_prefix: String,
    /// `None` means permissive CORS.
    pub cors_origin: Option<String>,
    /// Upper bound for `limit` query parameters.
    pub max_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api/v1".into(),
            cors_origin: None,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub user_agent: String,
    pub timeout_ms: u64,
    pub staleness_days: i64,
    /// How many recent articles search and category views scan.
    pub search_window: usize,
    pub default_limit: usize,
    pub mock_fallback: bool,
    pub schema: ExtractionSchema,
    pub sources: Vec<SourceSpec>,
}

impl NewsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            user_agent: "Market-Sum-News-Bot/1.0".into(),
            timeout_ms: 10_000,
            staleness_days: 7,
            search_window: 100,
            default_limit: 20,
            mock_fallback: true,
            schema: ExtractionSchema::default(),
            sources: vec![
                SourceSpec::new("Reuters", "https://feeds.reuters.com/reuters/businessNews"),
                SourceSpec::new("CNBC", "https://www.cnbc.com/id/100003114/device/rss/rss.html"),
                SourceSpec::new(
                    "MarketWatch",
                    "https://feeds.content.dowjones.io/public/rss/mw_topstories",
                ),
                SourceSpec::new("Yahoo Finance", "https://finance.yahoo.com/news/rssindex"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub chart_base_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub default_limit: usize,
    pub mock_fallback: bool,
    pub indices: Vec<IndexSpec>,
    pub watchlist: Vec<String>,
}

impl MarketConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            chart_base_url: "https://query1.finance.yahoo.com/v8/finance/chart".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            timeout_ms: 10_000,
            default_limit: 10,
            mock_fallback: true,
            indices: vec![
                IndexSpec::new("^GSPC", "S&P 500"),
                IndexSpec::new("^AXJO", "ASX 200"),
                IndexSpec::new("^IXIC", "NASDAQ"),
                IndexSpec::new("^DJI", "Dow Jones"),
                IndexSpec::new("^FTSE", "FTSE 100"),
            ],
            watchlist: [
                "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "NFLX", "AMD", "INTC",
                "CRM", "ADBE", "PYPL", "UBER", "LYFT", "SNAP", "PINS", "ZM", "SHOP", "XYZ",
                "ROKU", "CRWD", "OKTA", "DOCU", "PLTR", "COIN", "HOOD", "RBLX", "SPOT",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl AppConfig {
    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $MARKET_CONFIG_PATH
    /// 2) config/app.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(ms) = std::env::var(ENV_NEWS_TIMEOUT_MS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.news.timeout_ms = ms;
        }
        if let Ok(url) = std::env::var(ENV_CHART_BASE_URL) {
            if !url.trim().is_empty() {
                self.market.chart_base_url = url.trim().to_string();
            }
        }
        if let Ok(prefix) = std::env::var(ENV_API_PREFIX) {
            self.server.api_prefix = prefix.trim().to_string();
        }
    }

    fn sanitize(&mut self) {
        if self.server.max_limit == 0 {
            self.server.max_limit = ServerConfig::default().max_limit;
        }
        if self.news.search_window == 0 {
            self.news.search_window = NewsConfig::default().search_window;
        }
        self.news.default_limit = self.news.default_limit.clamp(1, self.server.max_limit);
        self.market.default_limit = self.market.default_limit.clamp(1, self.server.max_limit);
        if self.news.staleness_days <= 0 {
            self.news.staleness_days = NewsConfig::default().staleness_days;
        }
        // a zero timeout fails every request before it is sent
        if self.news.timeout_ms == 0 {
            self.news.timeout_ms = NewsConfig::default().timeout_ms;
        }
        if self.market.timeout_ms == 0 {
            self.market.timeout_ms = MarketConfig::default().timeout_ms;
        }
    }
}
