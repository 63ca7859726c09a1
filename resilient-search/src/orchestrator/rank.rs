//! Diversity-preserving ranking of deduplicated results.
//!
//! Results are split into one lane per provider (the provider whose entry
//! survived dedup), each lane is sorted by score, and the final list is built
//! by taking one result from each lane in provider-priority order, round
//! after round. A provider returning many results therefore cannot push a
//! provider returning few off the first page.

use std::cmp::Ordering;

use crate::types::ProviderResult;

use super::dedup::{deduplicate, DeduplicatedResult, ProviderBatch};

/// Interleave deduplicated results across providers and assign ranks.
///
/// `provider_count` is the number of provider lanes; entries whose
/// `primary` index is out of range are appended to the last lane.
pub fn interleave(deduped: Vec<DeduplicatedResult>, provider_count: usize) -> Vec<ProviderResult> {
    let lanes_len = provider_count.max(1);
    let mut lanes: Vec<Vec<ProviderResult>> = vec![Vec::new(); lanes_len];
    for entry in deduped {
        let lane = entry.primary.min(lanes_len - 1);
        lanes[lane].push(entry.result);
    }

    // Stable sort: equal scores keep first-seen order.
    for lane in &mut lanes {
        lane.sort_by(by_score_desc);
    }

    let total: usize = lanes.iter().map(Vec::len).sum();
    let mut cursors: Vec<std::vec::IntoIter<ProviderResult>> =
        lanes.into_iter().map(Vec::into_iter).collect();
    let mut ranked = Vec::with_capacity(total);

    while ranked.len() < total {
        for cursor in &mut cursors {
            if let Some(result) = cursor.next() {
                ranked.push(result);
            }
        }
    }

    for (position, result) in ranked.iter_mut().enumerate() {
        result.rank = position + 1;
    }
    ranked
}

/// Deduplicate, interleave, and rank provider batches in one step.
///
/// `batches` must be in provider-priority order.
pub fn merge_and_rank(batches: &[ProviderBatch]) -> Vec<ProviderResult> {
    interleave(deduplicate(batches), batches.len())
}

fn by_score_desc(a: &ProviderResult, b: &ProviderResult) -> Ordering {
    b.score.total_cmp(&a.score)
}
