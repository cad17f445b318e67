// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::record::Platform;
use crate::scoring::RankingWeights;

pub const ENV_PATH: &str = "TREND_CONFIG_PATH";

/// Everything the service reads from `config/trends.{toml,json}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub weights: RankingWeights,
    pub aggregator: AggregatorSettings,
    pub feeds: FeedUrls,
    /// Where combined results are persisted; `None` disables the file sink.
    pub data_dir: Option<PathBuf>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            aggregator: AggregatorSettings::default(),
            feeds: FeedUrls::default(),
            data_dir: Some(PathBuf::from("data")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    /// Topic for `/top_5.json` when the query omits one.
    pub default_topic: String,
    /// Topic for `/api/scrape/combined` when the body omits one.
    pub combined_topic: String,
    pub fetch_timeout_secs: u64,
    pub top_n: usize,
    /// Merge order of sources; also the order errors are reported in.
    pub source_order: Vec<Platform>,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            default_topic: "trending".to_string(),
            combined_topic: "aitools".to_string(),
            fetch_timeout_secs: 30,
            top_n: 5,
            source_order: vec![Platform::TikTok, Platform::YouTube],
        }
    }
}

/// Scraper sidecar endpoints. `{topic}` is substituted per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedUrls {
    pub tiktok: Option<String>,
    pub youtube: Option<String>,
}

impl FeedUrls {
    pub fn for_platform(&self, p: Platform) -> Option<&str> {
        match p {
            Platform::TikTok => self.tiktok.as_deref(),
            Platform::YouTube => self.youtube.as_deref(),
        }
        .map(str::trim)
        .filter(|s| !s.is_empty())
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<TrendConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading trend config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks:
/// 1) $TREND_CONFIG_PATH
/// 2) config/trends.toml
/// 3) config/trends.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<TrendConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/trends.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/trends.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(TrendConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<TrendConfig> {
    let cfg = match hint_ext {
        "toml" => toml::from_str::<TrendConfig>(s).context("parsing trend config toml")?,
        "json" => serde_json::from_str::<TrendConfig>(s).context("parsing trend config json")?,
        _ => {
            // Unknown extension: JSON first (cheap to reject), then TOML.
            if let Ok(c) = serde_json::from_str::<TrendConfig>(s) {
                c
            } else {
                toml::from_str::<TrendConfig>(s)
                    .map_err(|_| anyhow!("unsupported trend config format"))?
            }
        }
    };
    Ok(finish(cfg))
}

fn finish(mut cfg: TrendConfig) -> TrendConfig {
    cfg.weights = cfg.weights.sanitized();

    // Keep the first occurrence of each platform; an empty list means default order.
    let mut seen = Vec::with_capacity(Platform::ALL.len());
    for p in cfg.aggregator.source_order.drain(..) {
        if !seen.contains(&p) {
            seen.push(p);
        }
    }
    if seen.is_empty() {
        seen = AggregatorSettings::default().source_order;
    }
    cfg.aggregator.source_order = seen;

    if cfg.aggregator.fetch_timeout_secs == 0 {
        cfg.aggregator.fetch_timeout_secs = AggregatorSettings::default().fetch_timeout_secs;
    }
    cfg
}
