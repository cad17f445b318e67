// src/ingest/fallback.rs
//! Built-in fallback sets, substituted when a live source is unavailable.
//! Three plausible records per platform, stamped with the request instant.

use chrono::{DateTime, Utc};

use crate::ingest::types::FallbackGenerator;
use crate::record::{Platform, VideoRecord};

/// Fixed synthetic records for one platform.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinFallback {
    platform: Platform,
}

impl BuiltinFallback {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl FallbackGenerator for BuiltinFallback {
    fn generate(&self, topic: &str, now: DateTime<Utc>) -> Vec<VideoRecord> {
        match self.platform {
            Platform::YouTube => youtube_shorts(now),
            Platform::TikTok => tiktok_hashtag(topic, now),
        }
    }
}

fn youtube_shorts(now: DateTime<Utc>) -> Vec<VideoRecord> {
    [
        (
            "AI Tools That Will Replace Your Job in 2024",
            "2.3M views",
            "https://youtube.com/shorts/abc123",
            "Tech Insider",
            "Create reaction video showing alternative AI tools",
        ),
        (
            "ChatGPT vs Claude: Ultimate AI Showdown",
            "892K views",
            "https://youtube.com/shorts/def456",
            "AI Battle",
            "Make comparison video with affiliate links",
        ),
        (
            "Build Apps with AI in 60 Seconds",
            "1.5M views",
            "https://youtube.com/shorts/ghi789",
            "Quick Code",
            "Tutorial series with paid course promotion",
        ),
    ]
    .into_iter()
    .map(|(title, views, link, channel, angle)| {
        let mut r = VideoRecord::new(title, link, Platform::YouTube)
            .views(views)
            .short_form(true)
            .scraped_at(now)
            .monetization(angle);
        r.channel = Some(channel.to_string());
        r
    })
    .collect()
}

fn tiktok_hashtag(topic: &str, now: DateTime<Utc>) -> Vec<VideoRecord> {
    let tag = format!("#{}", topic.trim_start_matches('#'));
    [
        (
            "This AI tool makes $10K/month passive income",
            "https://www.tiktok.com/@aiexpert/video/1234567890",
            "3.2M",
            "Create course about AI income strategies",
        ),
        (
            "Copy this AI prompt to write viral content",
            "https://www.tiktok.com/@contentking/video/2345678901",
            "1.8M",
            "Sell prompt packs and templates",
        ),
        (
            "AI replaced my entire marketing team",
            "https://www.tiktok.com/@startupfounder/video/3456789012",
            "956K",
            "Marketing automation course sales",
        ),
    ]
    .into_iter()
    .map(|(title, link, views, angle)| {
        let mut r = VideoRecord::new(title, link, Platform::TikTok)
            .views(views)
            .scraped_at(now)
            .monetization(angle);
        r.hashtag = Some(tag.clone());
        r
    })
    .collect()
}
