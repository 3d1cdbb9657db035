//! Ranking pipeline: score, dedupe, sort, and decide whether results
//! are weak enough to warrant the AI rewrite stage.

pub mod dedup;
pub mod scoring;

use crate::types::ScoredCandidate;

/// Results with fewer than this many entries at or above the score
/// threshold still trigger the fallback, even when the best match is
/// strong.
const MIN_GOOD_RESULTS: usize = 3;

/// Sort by score descending. Equal scores break ties by shorter display
/// name, then alphabetically, so equal-score orderings are
/// deterministic and reproducible.
pub fn sort_by_score(results: &mut [ScoredCandidate]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.candidate
                    .display_name
                    .len()
                    .cmp(&b.candidate.display_name.len())
            })
            .then_with(|| a.candidate.display_name.cmp(&b.candidate.display_name))
    });
}

/// Decide whether the AI rewrite stage should run.
///
/// True when the result set is too small, the best score is below the
/// threshold, or fewer than three results reach the threshold. The
/// triple condition avoids expensive AI calls when one weak match sits
/// among an otherwise strong set.
pub fn needs_ai_fallback(
    results: &[ScoredCandidate],
    min_results: usize,
    min_score_threshold: f64,
) -> bool {
    if results.len() < min_results {
        return true;
    }
    let best = results
        .iter()
        .map(|r| r.score)
        .fold(f64::NEG_INFINITY, f64::max);
    if best < min_score_threshold {
        return true;
    }
    let good = results
        .iter()
        .filter(|r| r.score >= min_score_threshold)
        .count();
    good < MIN_GOOD_RESULTS
}
