//! Multi-signal relevance scoring for food candidates.
//!
//! Each signal contributes a fixed weight; the relative magnitudes are
//! tuned so that `exact > contains > prefix > fuzzy` and so that one
//! strong name match outweighs any pile of small metadata bonuses.

use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::{levenshtein, normalize_query, tokenize};
use crate::types::{Candidate, MatchType, ScoreBreakdown, ScoredCandidate};

// Name-match signals.
const EXACT_MATCH: f64 = 100.0;
const CONTAINS_QUERY: f64 = 60.0;
const TOKEN_OVERLAP_PER_TOKEN: f64 = 15.0;
const NAME_PREFIX: f64 = 25.0;
const TOKEN_PREFIX_PER_HIT: f64 = 5.0;
const BRAND_TOKEN_PER_HIT: f64 = 8.0;
const CATEGORY_TOKEN_PER_HIT: f64 = 6.0;
const FUZZY_BASE: f64 = 30.0;
const FUZZY_PER_EDIT: f64 = 8.0;
const FUZZY_MAX_DISTANCE: usize = 2;
/// Fuzzy comparisons run against the name prefix truncated to the query
/// length plus this slack.
const FUZZY_PREFIX_SLACK: usize = 5;

// Name-length shaping.
const SHORT_NAME_BONUS: f64 = 10.0;
const LONG_NAME_PENALTY: f64 = -5.0;
const VERY_LONG_NAME_PENALTY: f64 = -15.0;
const SHORT_NAME_MAX: usize = 25;
const MEDIUM_NAME_MAX: usize = 50;
const LONG_NAME_MAX: usize = 80;

// Metadata signals.
const NUTRIENT_FIELD_BONUS: f64 = 2.0;
const ALL_MACROS_BONUS: f64 = 5.0;
const BRAND_PRESENCE_BONUS: f64 = 5.0;
const SUPPLEMENT_PENALTY: f64 = -25.0;
const INGREDIENT_LIST_PENALTY: f64 = -15.0;

// Multi-token query shaping (>= 2 query tokens only).
const ALL_TOKENS_MATCHED_BONUS: f64 = 20.0;
const UNMATCHED_TOKEN_PENALTY: f64 = -10.0;
const RAW_COMMODITY_PENALTY: f64 = -20.0;

fn supplement_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)\b(supplement|capsule|tablet|softgel|gummies|multivitamin)s?\b")
                .expect("valid regex"),
            Regex::new(r"(?i)\b\d+\s*mg\b").expect("valid regex"),
        ]
    })
}

fn ingredient_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)\bingredients?\s*:").expect("valid regex"),
            // Very long parentheticals are ingredient dumps, not names.
            Regex::new(r"\([^)]{40,}\)").expect("valid regex"),
        ]
    })
}

/// USDA-style raw-commodity entries ("Fat, beef", "Peanuts, salted").
/// Penalised only for multi-token queries, where the user is describing
/// a dish rather than an ingredient.
fn raw_commodity_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)^(fat|oil|butter|lard|tallow),").expect("valid regex"),
            Regex::new(r"(?i),\s*(raw|boiled|salted|unsalted|dried|dehydrated|frozen)$")
                .expect("valid regex"),
        ]
    })
}

/// Accumulates the score and the optional per-signal breakdown.
struct ScoreAcc {
    score: f64,
    breakdown: Option<ScoreBreakdown>,
}

impl ScoreAcc {
    fn new(with_breakdown: bool) -> Self {
        Self {
            score: 0.0,
            breakdown: with_breakdown.then(ScoreBreakdown::default),
        }
    }

    fn add(&mut self, signal: &'static str, value: f64) {
        self.score += value;
        if let Some(breakdown) = &mut self.breakdown {
            breakdown.push(signal, value);
        }
    }
}

/// Score a candidate against a query.
///
/// `with_breakdown` records per-signal contributions for debugging;
/// production paths pass `false`.
pub fn score_candidate(candidate: Candidate, query: &str, with_breakdown: bool) -> ScoredCandidate {
    let query_norm = normalize_query(query);
    let query_tokens = tokenize(&query_norm);
    let name_norm = normalize_query(&candidate.display_name);
    let name_tokens = tokenize(&name_norm);

    let mut acc = ScoreAcc::new(with_breakdown);
    let mut match_type = MatchType::None;

    // Strongest-first name signals.
    if !query_norm.is_empty() && name_norm == query_norm {
        acc.add("exact", EXACT_MATCH);
        match_type = MatchType::Exact;
    } else if !query_norm.is_empty() && name_norm.contains(&query_norm) {
        acc.add("contains", CONTAINS_QUERY);
        match_type = MatchType::Contains;
    }

    // Whole-token overlap.
    let overlapping = query_tokens
        .iter()
        .filter(|qt| name_tokens.iter().any(|nt| nt == *qt))
        .count();
    if overlapping > 0 {
        acc.add("token_overlap", TOKEN_OVERLAP_PER_TOKEN * overlapping as f64);
        if match_type == MatchType::None {
            match_type = MatchType::Token;
        }
    }

    if !query_norm.is_empty() && name_norm.starts_with(&query_norm) && name_norm != query_norm {
        acc.add("name_prefix", NAME_PREFIX);
        if match_type == MatchType::None {
            match_type = MatchType::Prefix;
        }
    }

    // Name tokens that extend (but don't equal) a query token.
    let mut token_prefix_hits = 0usize;
    for qt in &query_tokens {
        for nt in &name_tokens {
            if nt.starts_with(qt.as_str()) && nt != qt {
                token_prefix_hits += 1;
            }
        }
    }
    if token_prefix_hits > 0 {
        acc.add(
            "token_prefix",
            TOKEN_PREFIX_PER_HIT * token_prefix_hits as f64,
        );
    }

    // Brand and category token matches.
    if let Some(brand) = &candidate.brand {
        let brand_tokens = tokenize(&normalize_query(brand));
        let hits = query_tokens
            .iter()
            .filter(|qt| brand_tokens.iter().any(|bt| bt == *qt))
            .count();
        if hits > 0 {
            acc.add("brand_token", BRAND_TOKEN_PER_HIT * hits as f64);
        }
    }
    if let Some(categories) = &candidate.categories {
        let category_tokens: Vec<String> = categories
            .iter()
            .flat_map(|c| tokenize(&normalize_query(c)))
            .collect();
        let hits = query_tokens
            .iter()
            .filter(|qt| category_tokens.iter().any(|ct| ct == *qt))
            .count();
        if hits > 0 {
            acc.add("category_token", CATEGORY_TOKEN_PER_HIT * hits as f64);
        }
    }

    // Fuzzy fallback, only when nothing else matched.
    if match_type == MatchType::None && !query_norm.is_empty() {
        let prefix_len = query_norm.chars().count() + FUZZY_PREFIX_SLACK;
        let name_prefix: String = name_norm.chars().take(prefix_len).collect();
        let distance = levenshtein(&query_norm, &name_prefix);
        if distance <= FUZZY_MAX_DISTANCE {
            acc.add("fuzzy", FUZZY_BASE - FUZZY_PER_EDIT * distance as f64);
            match_type = MatchType::Fuzzy;
        }
    }

    // Name-length shaping: short names are usually canonical entries.
    let name_len = candidate.display_name.chars().count();
    if name_len < SHORT_NAME_MAX {
        acc.add("short_name", SHORT_NAME_BONUS);
    } else if name_len > LONG_NAME_MAX {
        acc.add("very_long_name", VERY_LONG_NAME_PENALTY);
    } else if name_len > MEDIUM_NAME_MAX {
        acc.add("long_name", LONG_NAME_PENALTY);
    }

    // Nutrient completeness.
    let present = candidate.nutrients.present_count();
    if present > 0 {
        acc.add("nutrient_fields", NUTRIENT_FIELD_BONUS * present as f64);
    }
    if candidate.nutrients.has_primary_macros() {
        acc.add("all_macros", ALL_MACROS_BONUS);
    }

    if candidate.brand.is_some() {
        acc.add("brand_present", BRAND_PRESENCE_BONUS);
    }

    // Supplements and ingredient dumps are not meals.
    for pattern in supplement_patterns() {
        if pattern.is_match(&candidate.display_name) {
            acc.add("supplement", SUPPLEMENT_PENALTY);
        }
    }
    for pattern in ingredient_patterns() {
        if pattern.is_match(&candidate.display_name) {
            acc.add("ingredient_list", INGREDIENT_LIST_PENALTY);
        }
    }

    // Multi-token shaping: a dish query should match all its words.
    if query_tokens.len() >= 2 {
        let matched = query_tokens
            .iter()
            .filter(|qt| {
                name_tokens
                    .iter()
                    .any(|nt| nt == *qt || nt.starts_with(qt.as_str()))
            })
            .count();
        let unmatched = query_tokens.len() - matched;
        if unmatched == 0 {
            acc.add("all_tokens_matched", ALL_TOKENS_MATCHED_BONUS);
        } else {
            acc.add(
                "unmatched_tokens",
                UNMATCHED_TOKEN_PENALTY * unmatched as f64,
            );
        }
        for pattern in raw_commodity_patterns() {
            if pattern.is_match(&candidate.display_name) {
                acc.add("raw_commodity", RAW_COMMODITY_PENALTY);
            }
        }
    }

    ScoredCandidate {
        candidate,
        score: acc.score,
        match_type,
        breakdown: acc.breakdown,
    }
}

/// Score a whole candidate set against a query.
pub fn score_all(candidates: Vec<Candidate>, query: &str) -> Vec<ScoredCandidate> {
    candidates
        .into_iter()
        .map(|c| score_candidate(c, query, false))
        .collect()
}
