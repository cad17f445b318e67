//! Short-form trend ranker — Binary Entrypoint
//! Boots the Axum HTTP server, wiring config, sources, metrics and routes.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_ranker::ingest::config::load_config_default;
use trend_ranker::metrics::Metrics;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_ranker=info,warn"));

    // Shuttle may already have installed a subscriber; that is fine.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = load_config_default()?;
    tracing::info!(
        sources = ?cfg.aggregator.source_order,
        timeout_secs = cfg.aggregator.fetch_timeout_secs,
        "trend config loaded"
    );

    let metrics = Metrics::init(&cfg.weights)?;
    let state = trend_ranker::build_state(&cfg)?;
    let router = trend_ranker::create_router(state).merge(metrics.router());

    Ok(router.into())
}
