use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::scoring::RankingWeights;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the active weights
    /// as static gauges.
    pub fn init(weights: &RankingWeights) -> Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        gauge!("trends_weight_platform_boost").set(weights.platform_boost);
        gauge!("trends_weight_short_form_bonus").set(weights.short_form_bonus);
        gauge!("trends_weight_decay_floor").set(weights.decay_floor);
        gauge!("trends_weight_decay_window_hours").set(weights.decay_window_hours);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
