//! # Score Calculator
//! Combines the normalized view magnitude with platform weighting, recency
//! decay and the short-form bonus into a single comparable integer.
//!
//! Order is fixed because every step is multiplicative on the running score:
//! 1. magnitude (see [`crate::normalize`])
//! 2. TikTok platform boost
//! 3. recency decay `max(floor, 1 - hours/window)`, skipped without a timestamp
//! 4. YouTube Shorts bonus
//! 5. round half away from zero (`f64::round`)
//!
//! "Now" and all constants come in through [`ScoreContext`]; nothing here reads
//! the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_views;
use crate::record::{Platform, VideoRecord};

/// Tunable multipliers. Defaults reproduce the production weighting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    /// Multiplier for TikTok records (faster virality cycle).
    pub platform_boost: f64,
    /// Linear decay window in hours.
    pub decay_window_hours: f64,
    /// Lowest decay multiplier; old content is discounted, never dropped.
    pub decay_floor: f64,
    /// Multiplier for YouTube records flagged as Shorts.
    pub short_form_bonus: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            platform_boost: 1.2,
            decay_window_hours: 24.0,
            decay_floor: 0.5,
            short_form_bonus: 1.3,
        }
    }
}

impl RankingWeights {
    /// Replace unusable values coming from config files.
    ///
    /// Negative or non-finite multipliers fall back to their defaults and the
    /// floor is clamped to `[0, 1]`. A non-positive window is kept as is and
    /// disables decay.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        fn mult(x: f64, fallback: f64) -> f64 {
            if x.is_finite() && x >= 0.0 {
                x
            } else {
                fallback
            }
        }
        Self {
            platform_boost: mult(self.platform_boost, d.platform_boost),
            decay_window_hours: if self.decay_window_hours.is_nan() {
                d.decay_window_hours
            } else {
                self.decay_window_hours
            },
            decay_floor: if self.decay_floor.is_finite() {
                self.decay_floor.clamp(0.0, 1.0)
            } else {
                d.decay_floor
            },
            short_form_bonus: mult(self.short_form_bonus, d.short_form_bonus),
        }
    }
}

/// Everything the calculator needs besides the record itself.
#[derive(Clone, Copy, Debug)]
pub struct ScoreContext {
    pub now: DateTime<Utc>,
    pub weights: RankingWeights,
}

impl ScoreContext {
    pub fn new(now: DateTime<Utc>, weights: RankingWeights) -> Self {
        Self { now, weights }
    }

    /// Default weights at the given instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self::new(now, RankingWeights::default())
    }
}

/// Per-step view of a score, handy for debugging ranking surprises.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub magnitude: f64,
    pub platform_multiplier: f64,
    /// `None` when the record has no timestamp.
    pub hours_elapsed: Option<f64>,
    pub decay_multiplier: f64,
    pub short_form_multiplier: f64,
    /// Score after platform weighting, before decay.
    pub pre_decay: f64,
    pub score: u64,
}

/// Decay multiplier for content captured `hours_elapsed` ago.
///
/// Timestamps in the future count as zero hours elapsed.
pub fn recency_multiplier(hours_elapsed: f64, weights: &RankingWeights) -> f64 {
    if weights.decay_window_hours <= 0.0 || !hours_elapsed.is_finite() {
        return 1.0;
    }
    let h = hours_elapsed.max(0.0);
    (1.0 - h / weights.decay_window_hours).max(weights.decay_floor)
}

/// Hours between `scraped_at` and `now`, fractional.
pub fn hours_between(scraped_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - scraped_at).num_milliseconds() as f64 / 3_600_000.0
}

/// Full step-by-step computation.
pub fn explain(record: &VideoRecord, ctx: &ScoreContext) -> ScoreBreakdown {
    let w = &ctx.weights;

    let magnitude = normalize_views(record.views_raw.as_deref());
    let mut score = magnitude;

    let platform_multiplier = match record.platform {
        Platform::TikTok => w.platform_boost,
        Platform::YouTube => 1.0,
    };
    score *= platform_multiplier;
    let pre_decay = score;

    let hours_elapsed = record.scraped_at.map(|at| hours_between(at, ctx.now));
    let decay_multiplier = hours_elapsed
        .map(|h| recency_multiplier(h, w))
        .unwrap_or(1.0);
    score *= decay_multiplier;

    let short_form_multiplier =
        if record.platform == Platform::YouTube && record.is_short_form == Some(true) {
            w.short_form_bonus
        } else {
            1.0
        };
    score *= short_form_multiplier;

    debug_assert!(score >= 0.0, "rank score must never be negative");
    let score = if score.is_finite() {
        score.round().max(0.0) as u64
    } else {
        0
    };

    ScoreBreakdown {
        magnitude,
        platform_multiplier,
        hours_elapsed,
        decay_multiplier,
        short_form_multiplier,
        pre_decay,
        score,
    }
}

/// Final `rank_score` for one record.
pub fn rank_score(record: &VideoRecord, ctx: &ScoreContext) -> u64 {
    explain(record, ctx).score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn rec(platform: Platform, views: &str) -> VideoRecord {
        VideoRecord::new("t", "https://example.test", platform).views(views)
    }

    #[test]
    fn missing_fields_score_zero() {
        let r = VideoRecord::new("t", "", Platform::YouTube);
        assert_eq!(rank_score(&r, &ScoreContext::at(now())), 0);
    }

    #[test]
    fn tiktok_gets_exactly_the_platform_boost() {
        let ctx = ScoreContext::at(now());
        let yt = rec(Platform::YouTube, "892K");
        let tt = rec(Platform::TikTok, "892K");
        let a = explain(&yt, &ctx);
        let b = explain(&tt, &ctx);
        assert_eq!(a.pre_decay, 892_000.0);
        assert_eq!(b.pre_decay, a.pre_decay * 1.2);
        assert_eq!(b.score, 1_070_400);
    }

    #[test]
    fn decay_is_linear_inside_the_window() {
        let ctx = ScoreContext::at(now());
        let r = rec(Platform::YouTube, "1M").scraped_at(now() - Duration::hours(6));
        let b = explain(&r, &ctx);
        assert!((b.decay_multiplier - 0.75).abs() < 1e-12);
        assert_eq!(b.score, 750_000);
    }

    #[test]
    fn decay_floor_clamps_old_content() {
        let w = RankingWeights::default();
        assert_eq!(recency_multiplier(100.0, &w), 0.5);
        assert_eq!(recency_multiplier(24.0, &w), 0.5);
        assert_eq!(recency_multiplier(18.0, &w), 0.5);

        let r = rec(Platform::YouTube, "1M").scraped_at(now() - Duration::hours(100));
        assert_eq!(rank_score(&r, &ScoreContext::at(now())), 500_000);
    }

    #[test]
    fn future_timestamps_do_not_boost() {
        let r = rec(Platform::YouTube, "1M").scraped_at(now() + Duration::hours(5));
        assert_eq!(rank_score(&r, &ScoreContext::at(now())), 1_000_000);
    }

    #[test]
    fn missing_timestamp_skips_decay() {
        let r = rec(Platform::TikTok, "3.2M");
        let b = explain(&r, &ScoreContext::at(now()));
        assert_eq!(b.hours_elapsed, None);
        assert_eq!(b.decay_multiplier, 1.0);
        assert_eq!(b.score, 3_840_000);
    }

    #[test]
    fn short_form_bonus_only_for_youtube() {
        let ctx = ScoreContext::at(now());
        let yt = rec(Platform::YouTube, "1.5M").short_form(true);
        let tt = rec(Platform::TikTok, "1.5M").short_form(true);
        assert_eq!(rank_score(&yt, &ctx), 1_950_000);
        assert_eq!(rank_score(&tt, &ctx), 1_800_000);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        let ctx = ScoreContext::at(now());
        let r = rec(Platform::YouTube, "0.0025K");
        assert_eq!(rank_score(&r, &ctx), 3);
        let r = rec(Platform::YouTube, "0.0035K");
        assert_eq!(rank_score(&r, &ctx), 4);
    }

    #[test]
    fn larger_magnitude_never_scores_lower() {
        let ctx = ScoreContext::at(now());
        let at = now() - Duration::hours(3);
        let mut prev = 0;
        for v in ["1K", "10K", "999K", "1M", "1.01M", "2B"] {
            let r = rec(Platform::YouTube, v).short_form(true).scraped_at(at);
            let s = rank_score(&r, &ctx);
            assert!(s >= prev, "{v} scored {s} < {prev}");
            prev = s;
        }
    }

    #[test]
    fn sanitized_replaces_bad_values() {
        let w = RankingWeights {
            platform_boost: -1.0,
            decay_window_hours: f64::NAN,
            decay_floor: 3.0,
            short_form_bonus: f64::INFINITY,
        }
        .sanitized();
        assert_eq!(w.platform_boost, 1.2);
        assert_eq!(w.decay_window_hours, 24.0);
        assert_eq!(w.decay_floor, 1.0);
        assert_eq!(w.short_form_bonus, 1.3);
    }

    #[test]
    fn zero_window_disables_decay() {
        let w = RankingWeights {
            decay_window_hours: 0.0,
            ..Default::default()
        };
        assert_eq!(recency_multiplier(500.0, &w), 1.0);
    }
}
