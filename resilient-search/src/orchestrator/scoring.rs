//! Position-based score synthesis for providers that report no relevance.
//!
//! Formula: `score = max(0.5, 1.0 - 0.1 * position_index)`
//!
//! The floor keeps unscored providers comparable with scored ones so the
//! per-provider sort in the ranker stays meaningful.

use crate::types::ProviderResult;

/// Lowest score a synthesised position score can reach.
const SCORE_FLOOR: f64 = 0.5;

/// Decay applied per position.
const POSITION_STEP: f64 = 0.1;

/// Calculate a score from a result's 0-based position in its provider list.
///
/// - Position 0 scores 1.0
/// - Position 4 scores 0.6
/// - Position 5 and later score 0.5
pub fn position_score(position: usize) -> f64 {
    (1.0 - POSITION_STEP * position as f64).max(SCORE_FLOOR)
}

/// Overwrite the `score` of every result with its position score.
pub fn score_by_position(mut results: Vec<ProviderResult>) -> Vec<ProviderResult> {
    for (position, result) in results.iter_mut().enumerate() {
        result.score = position_score(position);
    }
    results
}
