//! Contracts for the external collaborators: the nutrition provider
//! backend and the AI query-rewrite service.
//!
//! This crate consumes, but never implements, these services. Both
//! traits are dyn-safe so the orchestrator can hold them behind `Arc`
//! and tests can inject mocks.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::{Candidate, QueryRewrite};

/// The nutrition-database search backend.
#[async_trait]
pub trait FoodProvider: Send + Sync {
    /// One batched search carrying the primary query plus its variants.
    ///
    /// Implementations decide how variants are combined server-side;
    /// the orchestrator never issues one call per variant. `limit` caps
    /// the total result count.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SearchError::Provider`] on network or backend
    /// failure. The orchestrator treats any error as zero results.
    async fn search(
        &self,
        primary: &str,
        variants: &[String],
        limit: usize,
    ) -> Result<Vec<Candidate>>;
}

/// The AI query-rewrite service (e.g. an LLM).
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    /// Propose corrected/alternative queries for a weak search.
    ///
    /// Returns `Ok(None)` when no useful rewrite exists. The `cancel`
    /// token lets implementations abandon slow calls when the request
    /// has been superseded.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SearchError::Rewrite`] on timeout, failure, or
    /// a malformed response. The orchestrator skips enhancement on any
    /// error.
    async fn rewrite(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<QueryRewrite>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::types::Nutrients;

    /// Mock provider for testing trait bounds and async dispatch.
    struct MockProvider {
        results: Vec<Candidate>,
    }

    #[async_trait]
    impl FoodProvider for MockProvider {
        async fn search(
            &self,
            _primary: &str,
            _variants: &[String],
            limit: usize,
        ) -> Result<Vec<Candidate>> {
            if self.results.is_empty() {
                return Err(SearchError::Provider("mock provider failure".into()));
            }
            Ok(self.results.iter().take(limit).cloned().collect())
        }
    }

    struct MockRewriter;

    #[async_trait]
    impl QueryRewriter for MockRewriter {
        async fn rewrite(
            &self,
            query: &str,
            _cancel: &CancellationToken,
        ) -> Result<Option<QueryRewrite>> {
            Ok(Some(QueryRewrite {
                corrected_query: query.to_string(),
                alternative_queries: vec![],
                synonyms: vec![],
            }))
        }
    }

    fn make_candidate(name: &str) -> Candidate {
        Candidate {
            provider: "mock".into(),
            external_id: name.into(),
            display_name: name.into(),
            brand: None,
            categories: None,
            nutrients: Nutrients::default(),
        }
    }

    #[test]
    fn traits_are_object_safe() {
        fn assert_dyn(_p: &dyn FoodProvider, _r: &dyn QueryRewriter) {}
        let provider = MockProvider { results: vec![] };
        assert_dyn(&provider, &MockRewriter);
    }

    #[tokio::test]
    async fn mock_provider_respects_limit() {
        let provider = MockProvider {
            results: vec![
                make_candidate("a"),
                make_candidate("b"),
                make_candidate("c"),
            ],
        };
        let results = provider.search("q", &[], 2).await.expect("should succeed");
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn mock_provider_propagates_errors() {
        let provider = MockProvider { results: vec![] };
        let result = provider.search("q", &[], 10).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn mock_rewriter_echoes_query() {
        let rewrite = MockRewriter
            .rewrite("chicken", &CancellationToken::new())
            .await
            .expect("should succeed")
            .expect("should rewrite");
        assert_eq!(rewrite.corrected_query, "chicken");
    }
}
