//! Similarity-based deduplication of scored candidates.
//!
//! Two candidates collapse when they share a dedup key (first four name
//! tokens + normalized brand), or when one normalized name contains the
//! other and their calorie values sit within 15% of the larger. Among
//! duplicates the highest score survives; an incumbent is only replaced
//! by a strictly higher score.

use crate::normalize::{normalize_query, tokenize};
use crate::types::ScoredCandidate;

/// Name tokens contributing to the dedup key.
const KEY_TOKEN_COUNT: usize = 4;

/// Calorie proximity (fraction of the larger value) under which two
/// name-contained candidates are treated as the same food. Known
/// trade-off: unrelated foods sharing a calorie count can merge.
const CALORIE_PROXIMITY: f64 = 0.15;

/// Derived grouping key for candidates likely representing the same
/// real-world food item.
pub fn dedup_key(scored: &ScoredCandidate) -> String {
    let name_norm = normalize_query(&scored.candidate.display_name);
    let tokens = tokenize(&name_norm);
    let name_part = tokens
        .iter()
        .take(KEY_TOKEN_COUNT)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    let brand_part = scored
        .candidate
        .brand
        .as_deref()
        .map(normalize_query)
        .unwrap_or_default();
    format!("{name_part}|{brand_part}")
}

/// True when the candidates look like the same food despite different
/// dedup keys: one normalized name contains the other, and both calorie
/// values are present and within [`CALORIE_PROXIMITY`] of the larger.
fn is_similar(a: &ScoredCandidate, b: &ScoredCandidate) -> bool {
    let name_a = normalize_query(&a.candidate.display_name);
    let name_b = normalize_query(&b.candidate.display_name);
    if name_a.is_empty() || name_b.is_empty() {
        return false;
    }
    if !name_a.contains(&name_b) && !name_b.contains(&name_a) {
        return false;
    }

    match (a.candidate.nutrients.calories, b.candidate.nutrients.calories) {
        (Some(cal_a), Some(cal_b)) => {
            let larger = cal_a.max(cal_b);
            larger > 0.0 && (cal_a - cal_b).abs() <= larger * CALORIE_PROXIMITY
        }
        _ => false,
    }
}

/// Collapse duplicates, keeping the highest-scoring representative.
///
/// Input order is preserved for survivors. After this pass no two
/// survivors share a dedup key, and every survivor's score is >= the
/// scores of the duplicates it absorbed.
pub fn dedupe_results(scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut survivors: Vec<ScoredCandidate> = Vec::with_capacity(scored.len());
    let mut keys: Vec<String> = Vec::with_capacity(scored.len());

    for entry in scored {
        let key = dedup_key(&entry);
        let existing = keys
            .iter()
            .position(|k| *k == key)
            .or_else(|| survivors.iter().position(|s| is_similar(s, &entry)));

        match existing {
            Some(index) => {
                // Strictly higher score replaces; ties keep the incumbent.
                if entry.score > survivors[index].score {
                    survivors[index] = entry;
                    keys[index] = key;
                }
            }
            None => {
                survivors.push(entry);
                keys.push(key);
            }
        }
    }

    survivors
}
