//! # Video Records
//! Typed representation of a single short-form video as seen by the ranker.
//!
//! Upstream adapters hand back loosely shaped [`RawVideo`] values (every field
//! optional, views possibly numeric). [`VideoRecord::from_raw`] is the single
//! coercion point: after it, scoring and ranking never guard against missing
//! fields ad hoc.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Source identity of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// TikTok-style social video (fast virality cycle, gets the platform boost).
    #[serde(rename = "TikTok", alias = "tiktok")]
    TikTok,
    /// YouTube; Shorts content gets the short-form bonus.
    #[serde(rename = "YouTube", alias = "youtube")]
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::TikTok, Platform::YouTube];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok",
            Platform::YouTube => "YouTube",
        }
    }

    /// Case-insensitive lookup, used for config values and saved file names.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record exactly as an adapter produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVideo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub views: Option<String>,
    #[serde(default, alias = "is_short_form")]
    pub is_short: Option<bool>,
    #[serde(default)]
    pub scraped_at: Option<String>,
    #[serde(default)]
    pub monetization_angle: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub hashtag: Option<String>,
}

/// Normalized unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub title: String,
    pub link: String,
    /// Free-text metric as provided by the source, e.g. "2.3M views".
    #[serde(rename = "views", default)]
    pub views_raw: Option<String>,
    pub platform: Platform,
    #[serde(rename = "is_short", default, skip_serializing_if = "Option::is_none")]
    pub is_short_form: Option<bool>,
    #[serde(default)]
    pub scraped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub monetization_angle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtag: Option<String>,
}

impl VideoRecord {
    /// Minimal record; mostly useful for fallbacks and tests.
    pub fn new(title: impl Into<String>, link: impl Into<String>, platform: Platform) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            views_raw: None,
            platform,
            is_short_form: None,
            scraped_at: None,
            monetization_angle: String::new(),
            channel: None,
            hashtag: None,
        }
    }

    pub fn views(mut self, raw: impl Into<String>) -> Self {
        self.views_raw = Some(raw.into());
        self
    }

    pub fn short_form(mut self, is_short: bool) -> Self {
        self.is_short_form = Some(is_short);
        self
    }

    pub fn scraped_at(mut self, at: DateTime<Utc>) -> Self {
        self.scraped_at = Some(at);
        self
    }

    pub fn monetization(mut self, angle: impl Into<String>) -> Self {
        self.monetization_angle = angle.into();
        self
    }

    /// Coerce an adapter record into a `VideoRecord`.
    ///
    /// - `platform` is the adapter's identity; whatever the payload claims is ignored.
    /// - A missing `scraped_at` defaults to `fetched_at`; an unparseable one
    ///   becomes `None` (no recency decay).
    /// - Returns `None` when the title is empty after cleanup.
    pub fn from_raw(raw: RawVideo, platform: Platform, fetched_at: DateTime<Utc>) -> Option<Self> {
        let title = clean_text(raw.title.as_deref().unwrap_or_default());
        if title.is_empty() {
            return None;
        }

        let scraped_at = match raw.scraped_at.as_deref().map(str::trim) {
            None | Some("") => Some(fetched_at),
            Some(ts) => DateTime::parse_from_rfc3339(ts)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        };

        let views_raw = raw
            .views
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Some(Self {
            title,
            link: raw.link.map(|l| l.trim().to_string()).unwrap_or_default(),
            views_raw,
            platform,
            is_short_form: raw.is_short,
            scraped_at,
            monetization_angle: raw
                .monetization_angle
                .map(|m| clean_text(&m))
                .unwrap_or_default(),
            channel: raw.channel.map(|c| clean_text(&c)).filter(|c| !c.is_empty()),
            hashtag: raw.hashtag,
        })
    }
}

/// Decode HTML entities scraped from page text and collapse whitespace.
pub fn clean_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scrapers sometimes emit raw view counts as JSON numbers.
fn string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(de)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fetched() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn missing_scraped_at_defaults_to_fetch_time() {
        let raw = RawVideo {
            title: Some("  AI&nbsp;tools   rock ".into()),
            link: Some("https://example.test/v/1".into()),
            views: Some("892K views".into()),
            ..Default::default()
        };
        let rec = VideoRecord::from_raw(raw, Platform::YouTube, fetched()).unwrap();
        assert_eq!(rec.title, "AI tools rock");
        assert_eq!(rec.scraped_at, Some(fetched()));
        assert_eq!(rec.views_raw.as_deref(), Some("892K views"));
        assert_eq!(rec.platform, Platform::YouTube);
    }

    #[test]
    fn garbage_timestamp_means_no_decay() {
        let raw = RawVideo {
            title: Some("x".into()),
            scraped_at: Some("yesterday-ish".into()),
            ..Default::default()
        };
        let rec = VideoRecord::from_raw(raw, Platform::TikTok, fetched()).unwrap();
        assert_eq!(rec.scraped_at, None);
    }

    #[test]
    fn untitled_records_are_dropped() {
        let raw = RawVideo {
            title: Some("   ".into()),
            link: Some("https://example.test".into()),
            ..Default::default()
        };
        assert!(VideoRecord::from_raw(raw, Platform::TikTok, fetched()).is_none());
    }

    #[test]
    fn numeric_views_deserialize_as_text() {
        let raw: RawVideo = serde_json::from_str(r#"{"title":"t","views":12345}"#).unwrap();
        assert_eq!(raw.views.as_deref(), Some("12345"));
    }

    #[test]
    fn platform_parse_is_case_insensitive() {
        assert_eq!(Platform::parse("tiktok"), Some(Platform::TikTok));
        assert_eq!(Platform::parse(" YOUTUBE "), Some(Platform::YouTube));
        assert_eq!(Platform::parse("vimeo"), None);
    }
}
