// src/sink.rs
//! Persistence of aggregation results as pretty-printed JSON files.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::ingest::AggregationResult;
use crate::record::{Platform, VideoRecord};

#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    /// Store one result; returns the name it was stored under.
    async fn store(&self, result: &AggregationResult) -> Result<String>;

    /// Store one platform's records from a single-source scrape.
    async fn store_source(
        &self,
        platform: Platform,
        topic: &str,
        records: &[VideoRecord],
        at: DateTime<Utc>,
    ) -> Result<String>;
}

/// Writes `<dir>/combined_trends_<topic>_<unix_ms>.json` for aggregations and
/// per-platform files for single-source scrapes.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.dir.join(name);
        let body = serde_json::to_vec_pretty(value).context("serializing result")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("writing {}", path.display()))
    }
}

fn file_tag(topic: &str) -> String {
    topic
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '_' | '-'))
        .collect()
}

pub fn file_name_for(result: &AggregationResult) -> String {
    format!(
        "combined_trends_{}_{}.json",
        file_tag(&result.topic),
        result.generated_at.timestamp_millis()
    )
}

/// `tiktok_<topic>_trending_<ms>.json` or `youtube_shorts_trending_<ms>.json`.
pub fn source_file_name(platform: Platform, topic: &str, at: DateTime<Utc>) -> String {
    let ms = at.timestamp_millis();
    match platform {
        Platform::TikTok => format!("tiktok_{}_trending_{ms}.json", file_tag(topic)),
        Platform::YouTube => format!("youtube_shorts_trending_{ms}.json"),
    }
}

/// A bare file name: non-empty, no directory components, not `.`/`..`.
pub fn is_safe_name(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains(['/', '\\'])
        && Path::new(filename).file_name() == Some(OsStr::new(filename))
}

#[async_trait::async_trait]
impl ResultSink for JsonFileSink {
    async fn store(&self, result: &AggregationResult) -> Result<String> {
        let name = file_name_for(result);
        self.write_json(&name, result).await?;
        Ok(name)
    }

    async fn store_source(
        &self,
        platform: Platform,
        topic: &str,
        records: &[VideoRecord],
        at: DateTime<Utc>,
    ) -> Result<String> {
        let name = source_file_name(platform, topic, at);
        self.write_json(&name, records).await?;
        Ok(name)
    }
}

/// Listing entry for a saved result file.
#[derive(Debug, Clone, Serialize)]
pub struct SavedFile {
    pub filename: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub platform: Option<Platform>,
}

/// Saved `.json` files in `dir`, newest first. A missing dir lists as empty.
pub fn list_saved(dir: &Path) -> Result<Vec<SavedFile>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("listing {}", dir.display())),
    };

    let mut out = Vec::new();
    for e in entries.flatten() {
        let path = e.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let Ok(meta) = e.metadata() else { continue };
        let filename = e.file_name().to_string_lossy().to_string();
        let created = meta
            .created()
            .or_else(|_| meta.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_default();
        let lower = filename.to_ascii_lowercase();
        let platform = if lower.starts_with("combined") {
            None
        } else if lower.contains("tiktok") {
            Some(Platform::TikTok)
        } else {
            Some(Platform::YouTube)
        };
        out.push(SavedFile {
            filename,
            size: meta.len(),
            created,
            platform,
        });
    }
    out.sort_by(|a, b| b.created.cmp(&a.created).then(a.filename.cmp(&b.filename)));
    Ok(out)
}

/// Error from [`load_saved`]: the name itself is unusable, or the file
/// exists but could not be read or parsed.
#[derive(Debug)]
pub enum LoadError {
    InvalidName,
    Io(anyhow::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::InvalidName => f.write_str("invalid file name"),
            LoadError::Io(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Read one saved file back as JSON. Names with path components are rejected.
pub fn load_saved(dir: &Path, filename: &str) -> Result<Option<serde_json::Value>, LoadError> {
    if !is_safe_name(filename) {
        return Err(LoadError::InvalidName);
    }
    let path = dir.join(filename);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LoadError::Io(
                anyhow!(e).context(format!("reading {}", path.display())),
            ))
        }
    };
    let v = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))
        .map_err(LoadError::Io)?;
    Ok(Some(v))
}
