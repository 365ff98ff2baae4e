//! Market Summary API: binary entrypoint.
//! Boots the Axum HTTP server with news and market routes.

use market_summary_api::{app, init_tracing, AppConfig};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = AppConfig::load_default()?;
    tracing::info!(
        prefix = %config.server.api_prefix,
        news_sources = config.news.sources.len(),
        metrics = config.metrics.enabled,
        "starting market summary api"
    );

    let router = app(config)?;
    Ok(router.into())
}
