//! # Ranker
//! Scores a merged record list and orders it for downstream automation.
//!
//! Sorting is stable: equal scores keep their merged-list order, and the
//! `original_index` field makes that order visible to consumers. Ranks are
//! dense and 1-based.

use serde::{Deserialize, Serialize};

use crate::record::VideoRecord;
use crate::scoring::{rank_score, ScoreContext};

/// A record plus the fields the ranker derives for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVideo {
    #[serde(flatten)]
    pub record: VideoRecord,
    pub rank_score: u64,
    /// Position in the merged, pre-sort list (0-based).
    pub original_index: usize,
    /// Position after sorting (1-based, no gaps).
    pub final_rank: usize,
}

/// Score, sort and rank. `records` must be in arrival order, source by source.
pub fn rank_records(records: Vec<VideoRecord>, ctx: &ScoreContext) -> Vec<RankedVideo> {
    let mut ranked = records
        .into_iter()
        .enumerate()
        .map(|(original_index, record)| RankedVideo {
            rank_score: rank_score(&record, ctx),
            record,
            original_index,
            final_rank: 0,
        })
        .collect::<Vec<_>>();

    // `sort_by` is stable; the explicit index tie-break documents the contract.
    ranked.sort_by(|a, b| {
        b.rank_score
            .cmp(&a.rank_score)
            .then(a.original_index.cmp(&b.original_index))
    });

    for (pos, item) in ranked.iter_mut().enumerate() {
        item.final_rank = pos + 1;
    }

    tracing::debug!(
        target: "rank",
        count = ranked.len(),
        top_score = ranked.first().map(|r| r.rank_score).unwrap_or(0),
        "ranked records"
    );

    ranked
}

/// Prefix view of a ranked list; asking for more than exists returns everything.
pub fn top_n(ranked: &[RankedVideo], n: usize) -> &[RankedVideo] {
    &ranked[..n.min(ranked.len())]
}
