// tests/providers_json_feed.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use trend_ranker::ingest::providers::JsonFeedProvider;
use trend_ranker::ingest::types::SourceAdapter;
use trend_ranker::{Aggregator, Platform, RankingWeights};

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|_| panic!("missing tests/fixtures/{name}"))
}

#[tokio::test]
async fn tiktok_fixture_parses_raw_items() {
    let p = JsonFeedProvider::from_fixture(Platform::TikTok, &fixture("tiktok_feed.json"));
    let items = p.fetch("aitools").await.expect("tiktok parse ok");
    assert_eq!(items.len(), 4);
    assert_eq!(items[0].views.as_deref(), Some("4.1M"));
    assert_eq!(p.name(), "TikTok");
}

#[tokio::test]
async fn fixtures_flow_through_the_aggregator() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let agg = Aggregator::new(RankingWeights::default(), Duration::from_secs(5))
        .with_source(Arc::new(JsonFeedProvider::from_fixture(
            Platform::TikTok,
            &fixture("tiktok_feed.json"),
        )))
        .with_source(Arc::new(JsonFeedProvider::from_fixture(
            Platform::YouTube,
            &fixture("youtube_feed.json"),
        )));

    let res = agg.aggregate_at("aitools", now).await;
    assert!(res.errors.is_empty(), "{:?}", res.errors);

    // Untitled TikTok card is dropped during coercion.
    assert_eq!(res.count_for(Platform::TikTok), 3);
    assert_eq!(res.count_for(Platform::YouTube), 2);
    assert_eq!(res.combined.len(), 5);

    // 4.1M * 1.2 * (1 - 1/24) = 4_715_000
    let top = &res.combined[0];
    assert_eq!(top.record.title, "5 AI tools nobody talks about & why");
    assert_eq!(top.rank_score, 4_715_000);

    // Stats that failed to load sink to the bottom.
    let last = res.combined.last().unwrap();
    assert_eq!(last.record.title, "Stats failed to load");
    assert_eq!(last.rank_score, 0);
}
