//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls query gating, fallback thresholds, result
//! caps, and cache TTL tiers. The defaults match a meal-logging client:
//! fast, good-enough matches without blocking on slow AI calls.

use std::time::Duration;

use crate::error::SearchError;

/// Configuration for a food search operation.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Queries shorter than this (in chars, after trimming) are rejected
    /// with an empty response rather than sent to the provider.
    pub min_query_length: usize,
    /// Minimum number of results for a search to count as "good" without
    /// AI enhancement.
    pub min_results: usize,
    /// Minimum top score for a search to count as "good" without AI
    /// enhancement.
    pub min_score_threshold: f64,
    /// Maximum number of results returned after dedup and ranking.
    pub max_results: usize,
    /// Maximum number of query variants carried in one batched provider
    /// call, in addition to the primary query. Bounds call fan-out.
    pub max_query_variants: usize,
    /// TTL for cached combined search responses. Short: these mix in
    /// ranking logic that changes more often than the underlying data.
    pub search_ttl: Duration,
    /// TTL for cached raw provider results. Provider data changes rarely.
    pub provider_ttl: Duration,
    /// TTL for cached AI rewrites. Rewrites are query-intrinsic and
    /// reusable long-term.
    pub rewrite_ttl: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_length: 2,
            min_results: 3,
            min_score_threshold: 50.0,
            max_results: 50,
            max_query_variants: 3,
            search_ttl: Duration::from_secs(60 * 60),
            provider_ttl: Duration::from_secs(24 * 60 * 60),
            rewrite_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `min_query_length` must be greater than 0
    /// - `max_results` must be greater than 0
    /// - `max_query_variants` must be greater than 0
    /// - `min_score_threshold` must be finite and non-negative
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.min_query_length == 0 {
            return Err(SearchError::Config(
                "min_query_length must be greater than 0".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.max_query_variants == 0 {
            return Err(SearchError::Config(
                "max_query_variants must be greater than 0".into(),
            ));
        }
        if !self.min_score_threshold.is_finite() || self.min_score_threshold < 0.0 {
            return Err(SearchError::Config(
                "min_score_threshold must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.min_query_length, 2);
        assert_eq!(config.min_results, 3);
        assert!((config.min_score_threshold - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.max_results, 50);
        assert_eq!(config.max_query_variants, 3);
    }

    #[test]
    fn default_ttl_tiers() {
        let config = SearchConfig::default();
        assert_eq!(config.search_ttl, Duration::from_secs(3600));
        assert_eq!(config.provider_ttl, Duration::from_secs(86400));
        assert_eq!(config.rewrite_ttl, Duration::from_secs(604800));
        // Rewrites outlive provider results, which outlive combined responses.
        assert!(config.rewrite_ttl > config.provider_ttl);
        assert!(config.provider_ttl > config.search_ttl);
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_min_query_length_rejected() {
        let config = SearchConfig {
            min_query_length: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_query_length"));
    }

    #[test]
    fn zero_max_results_rejected() {
        let config = SearchConfig {
            max_results: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn zero_max_query_variants_rejected() {
        let config = SearchConfig {
            max_query_variants: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_query_variants"));
    }

    #[test]
    fn negative_score_threshold_rejected() {
        let config = SearchConfig {
            min_score_threshold: -1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_score_threshold"));
    }

    #[test]
    fn nan_score_threshold_rejected() {
        let config = SearchConfig {
            min_score_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
