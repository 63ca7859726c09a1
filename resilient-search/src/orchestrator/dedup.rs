//! Result deduplication by normalised URL.
//!
//! Groups results that refer to the same page (after URL normalisation)
//! and keeps only the highest-scored entry per URL. Tracks which providers
//! contributed each URL so the merged entry can be tagged `a+b` and the
//! ranker knows which provider's lane it belongs to.

use std::collections::HashMap;

use crate::types::ProviderResult;

use super::url_normalize::dedup_key;

/// One provider's successful result list, in provider-priority order.
#[derive(Debug, Clone)]
pub struct ProviderBatch {
    /// Provider id.
    pub provider: String,
    /// Results in the provider's own order.
    pub results: Vec<ProviderResult>,
}

impl ProviderBatch {
    /// Pair a provider id with its results.
    pub fn new(provider: impl Into<String>, results: Vec<ProviderResult>) -> Self {
        Self {
            provider: provider.into(),
            results,
        }
    }
}

/// A search result after deduplication.
#[derive(Debug, Clone)]
pub struct DeduplicatedResult {
    /// The best (highest-scored) result for this URL, with
    /// `source_provider` listing every contributor.
    pub result: ProviderResult,
    /// Priority index of the provider whose entry was kept.
    pub primary: usize,
    /// Priority indices of all contributing providers, ascending.
    pub providers: Vec<usize>,
}

/// Deduplicate results by normalised URL.
///
/// `batches` must be in provider-priority order. Results sharing a dedup key
/// are merged: the entry with the higher `score` is kept (ties keep the
/// earlier, higher-priority entry), empty `snippet`, `title`, and optional
/// metadata are backfilled from the other entry, and `source_provider`
/// becomes the contributing provider ids joined with `+`.
///
/// Results with an empty URL are never merged with anything.
///
/// Output order is first-seen order, which is deterministic for a given
/// input.
pub fn deduplicate(batches: &[ProviderBatch]) -> Vec<DeduplicatedResult> {
    let mut merged: Vec<DeduplicatedResult> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for (priority, batch) in batches.iter().enumerate() {
        for result in &batch.results {
            let result = with_finite_score(result);
            let key = dedup_key(&result.url);
            let existing = if key.is_empty() {
                None
            } else {
                index_by_key.get(&key).copied()
            };

            match existing {
                Some(slot) => absorb(&mut merged[slot], result, priority),
                None => {
                    if !key.is_empty() {
                        index_by_key.insert(key, merged.len());
                    }
                    merged.push(DeduplicatedResult {
                        result,
                        primary: priority,
                        providers: vec![priority],
                    });
                }
            }
        }
    }

    for entry in &mut merged {
        entry.result.source_provider = entry
            .providers
            .iter()
            .map(|&p| batches[p].provider.as_str())
            .collect::<Vec<_>>()
            .join("+");
    }

    merged
}

/// Copy of `result` with NaN or infinite scores replaced by 0.0.
fn with_finite_score(result: &ProviderResult) -> ProviderResult {
    let mut result = result.clone();
    if !result.score.is_finite() {
        result.score = 0.0;
    }
    result
}

/// Fold `incoming` into an existing merged entry.
fn absorb(entry: &mut DeduplicatedResult, incoming: ProviderResult, priority: usize) {
    if !entry.providers.contains(&priority) {
        entry.providers.push(priority);
        entry.providers.sort_unstable();
    }

    if incoming.score > entry.result.score {
        let previous = std::mem::replace(&mut entry.result, incoming);
        entry.primary = priority;
        backfill(&mut entry.result, &previous);
    } else {
        backfill(&mut entry.result, &incoming);
    }
}

/// Fill empty fields of `kept` from `other`.
fn backfill(kept: &mut ProviderResult, other: &ProviderResult) {
    if kept.snippet.trim().is_empty() && !other.snippet.trim().is_empty() {
        kept.snippet = other.snippet.clone();
    }
    if kept.title.trim().is_empty() && !other.title.trim().is_empty() {
        kept.title = other.title.clone();
    }
    if kept.published_at.is_none() {
        kept.published_at = other.published_at;
    }
    if kept.image_url.is_none() {
        kept.image_url = other.image_url.clone();
    }
    if kept.thumbnail_url.is_none() {
        kept.thumbnail_url = other.thumbnail_url.clone();
    }
}
