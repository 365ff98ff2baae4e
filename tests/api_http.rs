// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// Upstreams are scripted with StubFetcher; requests go through
// tower::ServiceExt::oneshot.

use std::sync::Arc;

use chrono::{Duration, Utc};
use http::{Request, StatusCode};
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use market_summary_api::http::StubFetcher;
use market_summary_api::ingest::types::SourceSpec;
use market_summary_api::{router, AppConfig, AppState};

const BODY_LIMIT: usize = 1024 * 1024;
const FEED_URL: &str = "http://feed.test/a";
const CHART_BASE: &str = "http://chart.test";

fn feed() -> String {
    let now = Utc::now();
    format!(
        r#"<rss version="2.0"><channel>
<item><title>Apple shares rally</title><description>Strong demand</description><link>https://news.test/1</link><pubDate>{}</pubDate></item>
<item><title>Oil slides</title><description>Weak outlook</description><link>https://news.test/2</link><pubDate>{}</pubDate></item>
</channel></rss>"#,
        (now - Duration::hours(1)).to_rfc2822(),
        (now - Duration::hours(2)).to_rfc2822(),
    )
}

fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.news.sources = vec![SourceSpec::new("Desk", FEED_URL)];
    cfg.market.chart_base_url = CHART_BASE.into();
    cfg
}

fn app_with(cfg: AppConfig, news: StubFetcher, market: StubFetcher) -> Router {
    let state = AppState::with_fetchers(cfg, Arc::new(news), Arc::new(market))
        .expect("build state");
    router(state)
}

/// Feed reachable, chart endpoint not.
fn test_router() -> Router {
    app_with(
        test_config(),
        StubFetcher::new().with(FEED_URL, feed()),
        StubFetcher::new(),
    )
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let (status, bytes) = get(app, uri).await;
    let v = serde_json::from_slice(&bytes).expect("json body");
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, bytes) = get(test_router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(bytes).unwrap().trim(), "OK");
}

#[tokio::test]
async fn news_is_wrapped_in_success_envelope() {
    let (status, v) = get_json(test_router(), "/api/v1/news?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert!(v.get("timestamp").is_some());
    assert!(v.get("degraded").is_none(), "live data carries no degraded flag");

    let data = v["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["title"], "Apple shares rally");
    assert_eq!(data[0]["sentiment"], "positive");
    assert!(data[0].get("publishedAt").is_some());
}

#[tokio::test]
async fn search_without_query_is_bad_request() {
    for uri in ["/api/v1/news/search", "/api/v1/news/search?query=%20%20"] {
        let (status, v) = get_json(test_router(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "Search query is required");
        assert_eq!(v["statusCode"], 400);
    }
}

#[tokio::test]
async fn malformed_limit_is_bad_request_json() {
    for uri in [
        "/api/v1/news?limit=abc",
        "/api/v1/news?limit=-1",
        "/api/v1/market/gainers?limit=1.5",
        "/api/v1/news/search?query=oil&limit=ten",
    ] {
        let (status, v) = get_json(test_router(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(v["success"], false, "{uri}");
        assert_eq!(v["statusCode"], 400, "{uri}");
        assert!(
            v["error"].as_str().unwrap().contains("limit"),
            "{uri}: error should name the parameter, got {}",
            v["error"]
        );
        assert!(v.get("timestamp").is_some());
    }
}

#[tokio::test]
async fn search_filters_articles() {
    let (status, v) = get_json(test_router(), "/api/v1/news/search?query=oil").await;
    assert_eq!(status, StatusCode::OK);
    let data = v["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["title"], "Oil slides");
}

#[tokio::test]
async fn category_route_accepts_unknown_category() {
    let (status, v) = get_json(test_router(), "/api/v1/news/category/whatever").await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["data"].is_array());
}

#[tokio::test]
async fn stock_falls_back_to_degraded_mock() {
    let (status, v) = get_json(test_router(), "/api/v1/market/stock/AAPL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert_eq!(v["degraded"], true);
    assert!(v["reason"].as_str().unwrap().contains("AAPL"));
    assert_eq!(v["data"]["symbol"], "AAPL");
    assert!(v["data"].get("changePercent").is_some());
}

#[tokio::test]
async fn invalid_symbol_is_bad_request() {
    let (status, v) = get_json(test_router(), "/api/v1/market/stock/AA%24PL").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].as_str().unwrap().starts_with("Invalid symbol"));
}

#[tokio::test]
async fn unknown_route_is_not_found_json() {
    let (status, v) = get_json(test_router(), "/api/v1/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"], "Cannot GET /api/v1/nope");
    assert_eq!(v["statusCode"], 404);
}

#[tokio::test]
async fn failure_without_fallback_is_500_with_reason() {
    let mut cfg = test_config();
    cfg.news.mock_fallback = false;
    let app = app_with(cfg, StubFetcher::new(), StubFetcher::new());

    let (status, v) = get_json(app, "/api/v1/news").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["success"], false);
    assert_eq!(v["error"], "all 1 news sources failed");
}

#[tokio::test]
async fn gainers_respect_limit() {
    let (status, v) = get_json(test_router(), "/api/v1/market/gainers?limit=3").await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["data"].as_array().unwrap().len() <= 3);
}
