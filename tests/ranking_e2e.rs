// tests/ranking_e2e.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use trend_ranker::ingest::types::SourceAdapter;
use trend_ranker::scoring::explain;
use trend_ranker::{
    rank_records, Aggregator, Platform, RankingWeights, RawVideo, ScoreContext, VideoRecord,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

struct Feed(Platform, Vec<RawVideo>);

#[async_trait]
impl SourceAdapter for Feed {
    async fn fetch(&self, _topic: &str) -> Result<Vec<RawVideo>> {
        Ok(self.1.clone())
    }
    fn platform(&self) -> Platform {
        self.0
    }
}

#[tokio::test]
async fn tiktok_outranks_youtube_short_in_the_reference_scenario() {
    let yt = RawVideo {
        title: Some("Build Apps with AI in 60 Seconds".into()),
        link: Some("https://youtube.com/shorts/ghi789".into()),
        views: Some("1.5M views".into()),
        is_short: Some(true),
        scraped_at: Some(now().to_rfc3339()),
        ..Default::default()
    };
    let tt = RawVideo {
        title: Some("This AI tool makes $10K/month passive income".into()),
        link: Some("https://www.tiktok.com/@aiexpert/video/1234567890".into()),
        views: Some("3.2M".into()),
        scraped_at: Some(now().to_rfc3339()),
        ..Default::default()
    };

    let agg = Aggregator::new(RankingWeights::default(), Duration::from_secs(5))
        .with_source(Arc::new(Feed(Platform::YouTube, vec![yt])))
        .with_source(Arc::new(Feed(Platform::TikTok, vec![tt])));
    let res = agg.aggregate_at("aitools", now()).await;

    assert!(res.errors.is_empty());
    assert_eq!(res.combined.len(), 2);

    let first = &res.combined[0];
    assert_eq!(first.record.platform, Platform::TikTok);
    assert_eq!(first.rank_score, 3_840_000);
    assert_eq!(first.final_rank, 1);
    assert_eq!(first.original_index, 1);

    let second = &res.combined[1];
    assert_eq!(second.record.platform, Platform::YouTube);
    assert_eq!(second.rank_score, 1_950_000);
    assert_eq!(second.final_rank, 2);
}

#[test]
fn platform_weighting_is_exactly_one_point_two() {
    let ctx = ScoreContext::at(now());
    for views in ["892K", "2.3M", "1.2B", "4.7K"] {
        let a = VideoRecord::new("t", "l", Platform::YouTube).views(views);
        let b = VideoRecord::new("t", "l", Platform::TikTok).views(views);
        let (ea, eb) = (explain(&a, &ctx), explain(&b, &ctx));
        assert!(
            (eb.pre_decay - ea.pre_decay * 1.2).abs() < 1e-6,
            "{views}: {} vs {}",
            eb.pre_decay,
            ea.pre_decay
        );
    }
}

#[test]
fn recency_floor_holds_at_one_hundred_hours() {
    let ctx = ScoreContext::at(now());
    let old = VideoRecord::new("t", "l", Platform::TikTok)
        .views("1M")
        .scraped_at(now() - chrono::Duration::hours(100));
    let b = explain(&old, &ctx);
    assert_eq!(b.decay_multiplier, 0.5);
    assert_eq!(b.score, 600_000);
}

#[test]
fn ranks_are_dense_for_mixed_inputs() {
    let views = ["1K", "N/A", "1K", "", "3M", "2.5B", "garbage", "1K", "999K"];
    let records: Vec<_> = views
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let p = if i % 2 == 0 {
                Platform::TikTok
            } else {
                Platform::YouTube
            };
            VideoRecord::new(format!("v{i}"), "l", p)
                .views(*v)
                .short_form(i % 3 == 0)
                .scraped_at(now() - chrono::Duration::hours(i as i64 * 7))
        })
        .collect();

    let ranked = rank_records(records, &ScoreContext::at(now()));

    let mut ranks: Vec<_> = ranked.iter().map(|r| r.final_rank).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, (1..=views.len()).collect::<Vec<_>>());

    for pair in ranked.windows(2) {
        assert!(pair[0].rank_score >= pair[1].rank_score);
        if pair[0].rank_score == pair[1].rank_score {
            assert!(pair[0].original_index < pair[1].original_index);
        }
    }
}

#[test]
fn equal_scores_keep_original_order() {
    let records = vec![
        VideoRecord::new("a", "l", Platform::YouTube).views("1K"),
        VideoRecord::new("b", "l", Platform::YouTube).views("1k views"),
        VideoRecord::new("c", "l", Platform::YouTube).views("1.0K"),
    ];
    let ranked = rank_records(records, &ScoreContext::at(now()));
    let titles: Vec<_> = ranked.iter().map(|r| r.record.title.as_str()).collect();
    assert_eq!(titles, ["a", "b", "c"]);
    assert!(ranked.iter().all(|r| r.rank_score == 1_000));
}
