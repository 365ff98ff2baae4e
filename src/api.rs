use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{FromRequestParts, OriginalUri, Path, Query, State},
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::fetched::Fetched;
use crate::http::{HttpFetch, ReqwestFetcher};
use crate::ingest::types::Article;
use crate::market::types::{MarketIndex, MarketSummary, Quote};
use crate::market::MarketService;
use crate::news::NewsService;

#[derive(Clone)]
pub struct AppState {
    pub news: Arc<NewsService>,
    pub market: Arc<MarketService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Services backed by real HTTP clients built from the config.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let news_http: Arc<dyn HttpFetch> = Arc::new(ReqwestFetcher::new(
            &config.news.user_agent,
            config.news.timeout(),
        )?);
        let market_http: Arc<dyn HttpFetch> = Arc::new(ReqwestFetcher::new(
            &config.market.user_agent,
            config.market.timeout(),
        )?);
        Self::with_fetchers(config, news_http, market_http)
    }

    /// Same as [`AppState::from_config`] but with caller-supplied fetchers.
    pub fn with_fetchers(
        config: AppConfig,
        news_http: Arc<dyn HttpFetch>,
        market_http: Arc<dyn HttpFetch>,
    ) -> Result<Self> {
        Ok(Self {
            news: Arc::new(NewsService::new(news_http, &config.news)?),
            market: Arc::new(MarketService::new(market_http, &config.market)),
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let prefix = normalize_prefix(&state.config.server.api_prefix);
    let cors = cors_layer(state.config.server.cors_origin.as_deref());

    let api = Router::new()
        .route("/market/stock/{symbol}", get(stock))
        .route("/market/indices", get(indices))
        .route("/market/summary", get(summary))
        .route("/market/gainers", get(gainers))
        .route("/market/losers", get(losers))
        .route("/news", get(latest_news))
        .route("/news/search", get(search_news))
        .route("/news/category/{category}", get(category_news));

    let base = Router::new().route("/health", get(|| async { "OK" }));
    let app = match prefix {
        Some(p) => base.nest(&p, api),
        None => base.merge(api),
    };

    app.fallback(not_found).layer(cors).with_state(state)
}

fn normalize_prefix(raw: &str) -> Option<String> {
    let t = raw.trim().trim_matches('/');
    (!t.is_empty()).then(|| format!("/{t}"))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(o) => CorsLayer::new()
            .allow_origin(o)
            .allow_methods([Method::GET])
            .allow_headers(Any),
        None => CorsLayer::very_permissive(),
    }
}

async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Cannot GET {}", uri.path()))
}

/// Uniform response envelope. `degraded`/`reason` appear only when some of
/// `data` is fallback data.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl<T> Envelope<T> {
    fn from_fetched(f: Fetched<T>) -> ApiResult<Json<Self>> {
        let (data, reason) = match f {
            Fetched::Live(d) => (d, None),
            Fetched::Degraded { data, reason } => (data, Some(reason)),
            Fetched::Failed(reason) => return Err(ApiError::Internal(reason)),
        };
        Ok(Json(Envelope {
            success: true,
            degraded: reason.is_some(),
            data,
            timestamp: Utc::now(),
            reason,
        }))
    }
}

/// `Query` whose rejection is answered with the JSON error body.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub limit: Option<usize>,
}

fn clamp_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    requested.unwrap_or(default).clamp(1, max.max(1))
}

fn valid_symbol(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 16
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '^' | '.' | '-' | '='))
}

async fn stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<Envelope<Quote>>> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ApiError::BadRequest("Symbol is required".into()));
    }
    if !valid_symbol(symbol) {
        return Err(ApiError::BadRequest(format!("Invalid symbol: {symbol}")));
    }
    Envelope::from_fetched(state.market.quote(symbol).await)
}

async fn indices(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<MarketIndex>>>> {
    Envelope::from_fetched(state.market.indices().await)
}

async fn summary(State(state): State<AppState>) -> ApiResult<Json<Envelope<MarketSummary>>> {
    Envelope::from_fetched(state.market.summary().await)
}

async fn gainers(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<LimitQuery>,
) -> ApiResult<Json<Envelope<Vec<Quote>>>> {
    let cfg = &state.config;
    let limit = clamp_limit(q.limit, cfg.market.default_limit, cfg.server.max_limit);
    Envelope::from_fetched(state.market.gainers(limit).await)
}

async fn losers(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<LimitQuery>,
) -> ApiResult<Json<Envelope<Vec<Quote>>>> {
    let cfg = &state.config;
    let limit = clamp_limit(q.limit, cfg.market.default_limit, cfg.server.max_limit);
    Envelope::from_fetched(state.market.losers(limit).await)
}

async fn latest_news(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<LimitQuery>,
) -> ApiResult<Json<Envelope<Vec<Article>>>> {
    let cfg = &state.config;
    let limit = clamp_limit(q.limit, cfg.news.default_limit, cfg.server.max_limit);
    Envelope::from_fetched(state.news.latest(limit).await)
}

async fn search_news(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Envelope<Vec<Article>>>> {
    let query = q.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Search query is required".into()));
    }
    let cfg = &state.config;
    let limit = clamp_limit(q.limit, cfg.news.default_limit, cfg.server.max_limit);
    Envelope::from_fetched(state.news.search(query, limit).await)
}

async fn category_news(
    State(state): State<AppState>,
    Path(category): Path<String>,
    ApiQuery(q): ApiQuery<LimitQuery>,
) -> ApiResult<Json<Envelope<Vec<Article>>>> {
    let category = category.trim();
    if category.is_empty() {
        return Err(ApiError::BadRequest("Category is required".into()));
    }
    let cfg = &state.config;
    let limit = clamp_limit(q.limit, cfg.news.default_limit, cfg.server.max_limit);
    Envelope::from_fetched(state.news.by_category(category, limit).await)
}
