// src/ingest/mod.rs
pub mod config;
pub mod fallback;
pub mod providers;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio::task::{AbortHandle, JoinHandle};

use crate::ingest::fallback::BuiltinFallback;
use crate::ingest::types::{FallbackGenerator, SourceAdapter};
use crate::rank::{rank_records, top_n, RankedVideo};
use crate::record::{Platform, VideoRecord};
use crate::scoring::{RankingWeights, ScoreContext};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "trends_source_fetch_total",
            "Source fetch attempts, by platform."
        );
        describe_counter!(
            "trends_source_degraded_total",
            "Source fetches replaced by fallback data, by platform."
        );
        describe_counter!(
            "trends_records_dropped_total",
            "Raw records rejected during coercion (e.g. no title)."
        );
        describe_counter!(
            "trends_records_ranked_total",
            "Records scored and ranked."
        );
        describe_histogram!("trends_fetch_ms", "Source fetch time in milliseconds.");
        describe_gauge!(
            "trends_last_run_ts",
            "Unix ts when an aggregation last completed."
        );
    });
}

/// What happened to one source during a request.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Fetched(Vec<VideoRecord>),
    /// Live fetch failed; `records` come from the fallback generator.
    Degraded {
        records: Vec<VideoRecord>,
        reason: String,
    },
}

impl SourceOutcome {
    pub fn records(&self) -> &[VideoRecord] {
        match self {
            SourceOutcome::Fetched(r) => r,
            SourceOutcome::Degraded { records, .. } => records,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SourceOutcome::Degraded { .. })
    }

    fn into_parts(self) -> (Vec<VideoRecord>, Option<String>) {
        match self {
            SourceOutcome::Fetched(r) => (r, None),
            SourceOutcome::Degraded { records, reason } => (records, Some(reason)),
        }
    }
}

/// Result of one aggregation request.
///
/// `combined` holds every record of every `per_source` list, ranked, with no
/// de-duplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub topic: String,
    pub generated_at: DateTime<Utc>,
    /// Raw, unscored records in arrival order.
    pub per_source: BTreeMap<Platform, Vec<VideoRecord>>,
    pub combined: Vec<RankedVideo>,
    /// One entry per degraded source, in source order.
    pub errors: Vec<String>,
}

impl AggregationResult {
    pub fn count_for(&self, platform: Platform) -> usize {
        self.per_source.get(&platform).map_or(0, Vec::len)
    }

    pub fn top(&self, n: usize) -> &[RankedVideo] {
        top_n(&self.combined, n)
    }
}

/// Aborts outstanding fetch tasks when the request future is dropped.
/// Aborting an already finished task is a no-op.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for h in &self.0 {
            h.abort();
        }
    }
}

struct SourceSlot {
    adapter: Arc<dyn SourceAdapter>,
    fallback: Arc<dyn FallbackGenerator>,
}

/// Fetches every configured source concurrently and ranks the merged result.
pub struct Aggregator {
    slots: Vec<SourceSlot>,
    fetch_timeout: Duration,
    weights: RankingWeights,
}

impl Aggregator {
    pub fn new(weights: RankingWeights, fetch_timeout: Duration) -> Self {
        Self {
            slots: Vec::new(),
            fetch_timeout,
            weights,
        }
    }

    /// Register a source with the built-in fallback set for its platform.
    pub fn with_source(self, adapter: Arc<dyn SourceAdapter>) -> Self {
        let fallback = Arc::new(BuiltinFallback::new(adapter.platform()));
        self.with_source_and_fallback(adapter, fallback)
    }

    pub fn with_source_and_fallback(
        mut self,
        adapter: Arc<dyn SourceAdapter>,
        fallback: Arc<dyn FallbackGenerator>,
    ) -> Self {
        self.slots.push(SourceSlot { adapter, fallback });
        self
    }

    pub fn weights(&self) -> RankingWeights {
        self.weights
    }

    /// Fetch one platform's first registered source, without fallback.
    ///
    /// Used by the single-platform scrape routes; errors (including the
    /// timeout and a missing source) are returned to the caller.
    pub async fn fetch_source(
        &self,
        platform: Platform,
        topic: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<VideoRecord>> {
        ensure_metrics_described();

        let slot = self
            .slots
            .iter()
            .find(|s| s.adapter.platform() == platform)
            .ok_or_else(|| anyhow!("no {platform} source configured"))?;
        counter!("trends_source_fetch_total", "platform" => platform.as_str()).increment(1);

        let adapter = Arc::clone(&slot.adapter);
        let owned_topic = topic.to_string();
        let timeout = self.fetch_timeout;
        let handle = tokio::spawn(async move {
            tokio::time::timeout(timeout, adapter.fetch(&owned_topic)).await
        });
        let _abort = AbortOnDrop(vec![handle.abort_handle()]);

        let raw = match handle.await {
            Ok(Ok(res)) => res.with_context(|| format!("{platform} fetch failed"))?,
            Ok(Err(_elapsed)) => {
                bail!("{platform} fetch timed out after {}s", timeout.as_secs_f64())
            }
            Err(join) if join.is_panic() => bail!("{platform} adapter panicked"),
            Err(join) => bail!("{platform} fetch task aborted: {join}"),
        };

        let records = raw
            .into_iter()
            .filter_map(|r| VideoRecord::from_raw(r, platform, now))
            .collect::<Vec<_>>();
        tracing::info!(target: "ingest", source = %platform, kept = records.len(), "single source fetched");
        Ok(records)
    }

    /// Aggregate using the wall clock for "now".
    pub async fn aggregate(&self, topic: &str) -> AggregationResult {
        self.aggregate_at(topic, Utc::now()).await
    }

    /// Aggregate at a fixed instant. Never fails: broken sources degrade to
    /// their fallback sets and are reported in `errors`.
    pub async fn aggregate_at(&self, topic: &str, now: DateTime<Utc>) -> AggregationResult {
        ensure_metrics_described();

        // Spawn every fetch before awaiting any; a panic stays inside its task.
        let handles = self
            .slots
            .iter()
            .map(|slot| {
                let adapter = Arc::clone(&slot.adapter);
                let topic = topic.to_string();
                let timeout = self.fetch_timeout;
                tokio::spawn(async move {
                    let t0 = std::time::Instant::now();
                    let res = tokio::time::timeout(timeout, adapter.fetch(&topic)).await;
                    (res, t0.elapsed())
                })
            })
            .collect::<Vec<_>>();
        let _abort = AbortOnDrop(handles.iter().map(JoinHandle::abort_handle).collect());

        let mut per_source: BTreeMap<Platform, Vec<VideoRecord>> = BTreeMap::new();
        let mut merged = Vec::new();
        let mut errors = Vec::new();

        for (slot, handle) in self.slots.iter().zip(handles) {
            let platform = slot.adapter.platform();
            let name = slot.adapter.name();
            counter!("trends_source_fetch_total", "platform" => platform.as_str()).increment(1);

            let attempt = match handle.await {
                Ok((Ok(Ok(raw)), elapsed)) => {
                    histogram!("trends_fetch_ms").record(elapsed.as_secs_f64() * 1_000.0);
                    let fetched = raw.len();
                    let records = raw
                        .into_iter()
                        .filter_map(|r| VideoRecord::from_raw(r, platform, now))
                        .collect::<Vec<_>>();
                    let dropped = fetched - records.len();
                    if dropped > 0 {
                        counter!("trends_records_dropped_total").increment(dropped as u64);
                    }
                    tracing::info!(
                        target: "ingest",
                        source = name,
                        kept = records.len(),
                        dropped,
                        "source fetched"
                    );
                    Ok(SourceOutcome::Fetched(records))
                }
                Ok((Ok(Err(e)), _)) => Err(format!("{e:#}")),
                Ok((Err(_elapsed), _)) => {
                    Err(format!("timed out after {}s", self.fetch_timeout.as_secs_f64()))
                }
                Err(join) if join.is_panic() => Err("adapter panicked".to_string()),
                Err(join) => Err(format!("fetch task aborted: {join}")),
            };

            let outcome = attempt.unwrap_or_else(|reason| {
                tracing::warn!(
                    target: "ingest",
                    source = name,
                    %reason,
                    "source failed, using fallback data"
                );
                counter!("trends_source_degraded_total", "platform" => platform.as_str())
                    .increment(1);
                SourceOutcome::Degraded {
                    records: slot.fallback.generate(topic, now),
                    reason: format!("{name} scraping failed, using fallback data: {reason}"),
                }
            });

            let (records, error) = outcome.into_parts();
            errors.extend(error);
            merged.extend(records.iter().cloned());
            per_source.entry(platform).or_default().extend(records);
        }

        let ctx = ScoreContext::new(now, self.weights);
        let combined = rank_records(merged, &ctx);

        counter!("trends_records_ranked_total").increment(combined.len() as u64);
        gauge!("trends_last_run_ts").set(now.timestamp().max(0) as f64);

        tracing::info!(
            target: "ingest",
            topic,
            total = combined.len(),
            degraded = errors.len(),
            "aggregation complete"
        );

        AggregationResult {
            topic: topic.to_string(),
            generated_at: now,
            per_source,
            combined,
            errors,
        }
    }
}
