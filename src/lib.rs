// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod fetched;
pub mod http;
pub mod metrics;
pub mod news;
pub mod sentiment;
pub mod users;

// Feed fetching, parsing and aggregation
pub mod ingest;

// Quotes, indices, gainers/losers
pub mod market;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::fetched::Fetched;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `market_summary_api=info,warn`.
/// `LOG_FORMAT=json` switches to JSON lines. Safe to call more than once
/// (later calls are no-ops).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("market_summary_api=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Build the full application router from a config: real HTTP fetchers,
/// plus `/metrics` when enabled.
pub fn app(config: AppConfig) -> anyhow::Result<axum::Router> {
    let metrics_enabled = config.metrics.enabled;
    let metrics = if metrics_enabled {
        Some(crate::metrics::Metrics::init(&config)?)
    } else {
        None
    };

    let state = AppState::from_config(config)?;
    let mut router = api::router(state);
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }
    Ok(router)
}
