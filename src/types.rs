//! Core types for food search candidates, scoring, and responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-serving nutrient values for a food candidate.
///
/// Every field is independently optional: providers frequently return
/// partial nutrition data, and the scorer rewards completeness rather
/// than requiring it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub fibre: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
}

impl Nutrients {
    /// Number of nutrient fields that carry a value.
    pub fn present_count(&self) -> usize {
        [
            self.calories,
            self.carbs,
            self.protein,
            self.fat,
            self.fibre,
            self.sugar,
            self.sodium,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }

    /// True when all four primary macros (calories, carbs, protein, fat)
    /// are present.
    pub fn has_primary_macros(&self) -> bool {
        self.calories.is_some()
            && self.carbs.is_some()
            && self.protein.is_some()
            && self.fat.is_some()
    }
}

/// A single food record returned by a nutrition provider.
///
/// `(provider, external_id)` together form the stable identity of the
/// record. Candidates are immutable once produced by the provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Which provider backend returned this record.
    pub provider: String,
    /// Provider-scoped stable identifier.
    pub external_id: String,
    /// Human-readable food name.
    pub display_name: String,
    /// Brand name, if the item is branded.
    pub brand: Option<String>,
    /// Provider-assigned categories, if any.
    pub categories: Option<Vec<String>>,
    /// Per-serving nutrients (each field independently optional).
    #[serde(default)]
    pub nutrients: Nutrients,
}

/// The strongest normalization-based signal that fired for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Normalized name equals the normalized query.
    Exact,
    /// Name contains the full query as a substring.
    Contains,
    /// At least one query token appears as a whole token in the name.
    Token,
    /// Name starts with the query.
    Prefix,
    /// Edit-distance match against the name prefix.
    Fuzzy,
    /// No match signal fired.
    None,
}

impl MatchType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::Token => "token",
            Self::Prefix => "prefix",
            Self::Fuzzy => "fuzzy",
            Self::None => "none",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-signal score contributions, recorded only when requested.
#[derive(Debug, Clone, Default)]
pub struct ScoreBreakdown {
    pub signals: Vec<(&'static str, f64)>,
}

impl ScoreBreakdown {
    pub fn push(&mut self, signal: &'static str, value: f64) {
        self.signals.push((signal, value));
    }
}

/// A candidate plus its relevance score.
///
/// Lives only inside the ranking pipeline; after sorting, only the
/// ordered [`Candidate`] list survives into the [`SearchResponse`].
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
    pub match_type: MatchType,
    /// Populated only in debug scoring mode.
    pub breakdown: Option<ScoreBreakdown>,
}

/// The unit returned to the caller and the unit cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Ranked, deduplicated candidates, best first.
    pub results: Vec<Candidate>,
    /// Typo-fixed or AI-corrected form of the query, when it differs
    /// from what the user typed.
    pub corrected_query: Option<String>,
    /// Alternative query phrasings suggested by the rewrite service.
    pub alternative_queries: Vec<String>,
    /// True when served from the combined-results cache.
    pub from_cache: bool,
    /// True when the AI rewrite stage contributed to these results.
    pub ai_rewrite_used: bool,
}

impl SearchResponse {
    /// The empty terminal response: zero results is a valid outcome,
    /// not an error.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Corrected and alternative queries produced by the rewrite service.
///
/// Consumed once per search and not retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRewrite {
    pub corrected_query: String,
    #[serde(default)]
    pub alternative_queries: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Pipeline stage tags for telemetry and progressive updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStage {
    /// Served directly from the combined-results cache.
    Cache,
    /// Provider search completed (may still be enhanced later).
    Provider,
    /// AI rewrite stage merged in additional results.
    AiEnhanced,
}

impl SearchStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Provider => "provider",
            Self::AiEnhanced => "ai_enhanced",
        }
    }
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_candidate(name: &str) -> Candidate {
        Candidate {
            provider: "usda".into(),
            external_id: "12345".into(),
            display_name: name.into(),
            brand: None,
            categories: None,
            nutrients: Nutrients::default(),
        }
    }

    #[test]
    fn candidate_serde_round_trip() {
        let mut candidate = make_candidate("Chicken Breast");
        candidate.brand = Some("Foster Farms".into());
        candidate.nutrients.calories = Some(165.0);

        let json = serde_json::to_string(&candidate).expect("serialize");
        let decoded: Candidate = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.display_name, "Chicken Breast");
        assert_eq!(decoded.brand.as_deref(), Some("Foster Farms"));
        assert_eq!(decoded.nutrients.calories, Some(165.0));
    }

    #[test]
    fn candidate_missing_nutrients_deserializes_to_default() {
        let json = r#"{"provider":"usda","external_id":"1","display_name":"Rice","brand":null,"categories":null}"#;
        let decoded: Candidate = serde_json::from_str(json).expect("deserialize");
        assert_eq!(decoded.nutrients, Nutrients::default());
    }

    #[test]
    fn nutrients_present_count() {
        let nutrients = Nutrients {
            calories: Some(100.0),
            protein: Some(5.0),
            ..Default::default()
        };
        assert_eq!(nutrients.present_count(), 2);
        assert_eq!(Nutrients::default().present_count(), 0);
    }

    #[test]
    fn nutrients_primary_macros() {
        let full = Nutrients {
            calories: Some(100.0),
            carbs: Some(10.0),
            protein: Some(5.0),
            fat: Some(2.0),
            ..Default::default()
        };
        assert!(full.has_primary_macros());

        let partial = Nutrients {
            calories: Some(100.0),
            ..Default::default()
        };
        assert!(!partial.has_primary_macros());
    }

    #[test]
    fn match_type_display() {
        assert_eq!(MatchType::Exact.to_string(), "exact");
        assert_eq!(MatchType::Contains.to_string(), "contains");
        assert_eq!(MatchType::Token.to_string(), "token");
        assert_eq!(MatchType::Prefix.to_string(), "prefix");
        assert_eq!(MatchType::Fuzzy.to_string(), "fuzzy");
        assert_eq!(MatchType::None.to_string(), "none");
    }

    #[test]
    fn match_type_serde_lowercase() {
        let json = serde_json::to_string(&MatchType::Exact).expect("serialize");
        assert_eq!(json, "\"exact\"");
    }

    #[test]
    fn search_response_empty_has_no_results() {
        let response = SearchResponse::empty();
        assert!(response.results.is_empty());
        assert!(response.corrected_query.is_none());
        assert!(!response.from_cache);
        assert!(!response.ai_rewrite_used);
    }

    #[test]
    fn search_response_serde_round_trip() {
        let response = SearchResponse {
            results: vec![make_candidate("Chicken Biryani")],
            corrected_query: Some("chicken biryani".into()),
            alternative_queries: vec!["biryani".into()],
            from_cache: false,
            ai_rewrite_used: true,
        };
        let json = serde_json::to_string(&response).expect("serialize");
        let decoded: SearchResponse = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.results.len(), 1);
        assert_eq!(decoded.corrected_query.as_deref(), Some("chicken biryani"));
        assert!(decoded.ai_rewrite_used);
    }

    #[test]
    fn query_rewrite_defaults_for_missing_lists() {
        let json = r#"{"corrected_query":"chicken biryani"}"#;
        let decoded: QueryRewrite = serde_json::from_str(json).expect("deserialize");
        assert_eq!(decoded.corrected_query, "chicken biryani");
        assert!(decoded.alternative_queries.is_empty());
        assert!(decoded.synonyms.is_empty());
    }

    #[test]
    fn search_stage_names() {
        assert_eq!(SearchStage::Cache.name(), "cache");
        assert_eq!(SearchStage::Provider.name(), "provider");
        assert_eq!(SearchStage::AiEnhanced.name(), "ai_enhanced");
    }
}
