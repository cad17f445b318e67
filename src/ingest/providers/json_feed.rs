// src/ingest/providers/json_feed.rs
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::ingest::types::SourceAdapter;
use crate::record::{Platform, RawVideo};

/// Scrapers keep at most this many cards per page.
pub const MAX_ITEMS_PER_SOURCE: usize = 10;

/// Adapter over a JSON array of scraped records.
///
/// The array is either embedded (fixtures, tests) or served over HTTP by a
/// scraping sidecar; `{topic}` in the URL is replaced by the requested tag.
pub struct JsonFeedProvider {
    platform: Platform,
    mode: Mode,
}

enum Mode {
    // Owned copy so tests can pass non-'static strings.
    Fixture(String),
    Http {
        url_template: String,
        client: reqwest::Client,
    },
    Disabled,
}

impl JsonFeedProvider {
    pub fn from_fixture(platform: Platform, s: &str) -> Self {
        Self {
            platform,
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(platform: Platform, url_template: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            platform,
            mode: Mode::Http {
                url_template: url_template.to_string(),
                client,
            },
        })
    }

    /// No feed configured: every fetch fails and the fallback kicks in.
    pub fn disabled(platform: Platform) -> Self {
        Self {
            platform,
            mode: Mode::Disabled,
        }
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<RawVideo>> {
        let t0 = std::time::Instant::now();
        let mut items: Vec<RawVideo> = serde_json::from_str(s)
            .with_context(|| format!("parsing {} feed json", self.platform))?;
        items.truncate(MAX_ITEMS_PER_SOURCE);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("trends_parse_ms").record(ms);
        counter!("trends_raw_items_total", "platform" => self.platform.as_str())
            .increment(items.len() as u64);
        Ok(items)
    }
}

/// Substitute `{topic}` with a percent-safe tag (leading `#` stripped).
fn render_url(template: &str, topic: &str) -> String {
    let tag: String = topic
        .trim()
        .trim_start_matches('#')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '_' | '-'))
        .collect();
    template.replace("{topic}", &tag)
}

#[async_trait]
impl SourceAdapter for JsonFeedProvider {
    async fn fetch(&self, topic: &str) -> Result<Vec<RawVideo>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http {
                url_template,
                client,
            } => {
                let url = render_url(url_template, topic);
                let resp = client
                    .get(&url)
                    .send()
                    .await
                    .with_context(|| format!("{} feed http get()", self.platform))?;
                let status = resp.status();
                if !status.is_success() {
                    bail!("{} feed returned HTTP {}", self.platform, status);
                }
                let body = resp
                    .text()
                    .await
                    .with_context(|| format!("{} feed http .text()", self.platform))?;
                self.parse_items_from_str(&body)
            }
            Mode::Disabled => Err(anyhow!("no feed configured for {}", self.platform)),
        }
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}
