// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::record::{Platform, RawVideo, VideoRecord};

/// One upstream source (scraper, feed, mock). May fail; the aggregator copes.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, topic: &str) -> Result<Vec<RawVideo>>;
    fn platform(&self) -> Platform;
    fn name(&self) -> &'static str {
        self.platform().as_str()
    }
}

/// Synthetic substitute used only when the matching adapter fails.
/// Must always succeed.
pub trait FallbackGenerator: Send + Sync {
    fn generate(&self, topic: &str, now: DateTime<Utc>) -> Vec<VideoRecord>;
}
