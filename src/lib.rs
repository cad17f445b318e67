// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod rank;
pub mod record;
pub mod scoring;
pub mod sink;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::ingest::{AggregationResult, Aggregator, SourceOutcome};
pub use crate::normalize::normalize_views;
pub use crate::rank::{rank_records, top_n, RankedVideo};
pub use crate::record::{Platform, RawVideo, VideoRecord};
pub use crate::scoring::{rank_score, RankingWeights, ScoreContext};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::ingest::config::TrendConfig;
use crate::ingest::providers::JsonFeedProvider;
use crate::sink::JsonFileSink;

/// Wire providers, aggregator and sink from a loaded config.
///
/// Platforms without a feed URL get a disabled provider, so requests still
/// succeed on fallback data and report the degradation.
pub fn build_state(cfg: &TrendConfig) -> Result<AppState> {
    let timeout = Duration::from_secs(cfg.aggregator.fetch_timeout_secs);
    let mut aggregator = Aggregator::new(cfg.weights, timeout);

    for &platform in &cfg.aggregator.source_order {
        let provider = match cfg.feeds.for_platform(platform) {
            Some(url) => JsonFeedProvider::from_url(platform, url, timeout)?,
            None => {
                tracing::warn!(%platform, "no feed url configured; fallback data only");
                JsonFeedProvider::disabled(platform)
            }
        };
        aggregator = aggregator.with_source(Arc::new(provider));
    }

    let mut state = AppState::new(aggregator, cfg.aggregator.clone());
    if let Some(dir) = &cfg.data_dir {
        state = state.with_sink(Arc::new(JsonFileSink::new(dir.clone())), dir.clone());
    }
    Ok(state)
}
