//! # food-search
//!
//! Food-search orchestration core for a meal-logging client: matches
//! free-text food descriptions ("chikcen biryani") against a nutrition
//! provider and returns ranked, deduplicated candidates, correcting
//! typos and falling back to an AI query-rewrite service when results
//! are weak.
//!
//! ## Design
//!
//! - Normalizes queries (diacritics, typos, aliases, plural forms) and
//!   expands bounded variant sets before one batched provider call
//! - Multi-signal relevance scoring with similarity-based dedup and a
//!   deterministic sort
//! - TTL cache with lazy eviction and separate tiers for combined
//!   responses, raw provider results, and AI rewrites
//! - Staged orchestrator emitting progressive results, with monotonic
//!   request ids guarding against out-of-order responses
//! - The AI rewrite stage runs detached and re-verifies staleness
//!   before publishing
//!
//! The provider backend and the rewrite service are external
//! collaborators consumed through [`FoodProvider`] and
//! [`QueryRewriter`]; this crate never performs its own network I/O.
//!
//! ## Security
//!
//! - No network listeners — this is a library, not a server
//! - Search queries are logged only at trace/debug level
//! - No error in this crate is fatal: zero results is a valid outcome

pub mod cache;
pub mod config;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod provider;
pub mod ranking;
pub mod request;
pub mod telemetry;
pub mod types;

pub use cache::{CacheBackend, CacheStore, Clock, ManualClock, MemoryBackend, SystemClock};
pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use orchestrator::FoodSearchEngine;
pub use provider::{FoodProvider, QueryRewriter};
pub use request::{RequestContext, RequestManager};
pub use types::{
    Candidate, MatchType, Nutrients, QueryRewrite, ScoredCandidate, SearchResponse, SearchStage,
};

use std::sync::Arc;

/// Build a search engine with an in-memory cache and a fresh request
/// manager.
///
/// Convenience constructor for the common case; use
/// [`FoodSearchEngine::new`] directly to inject a durable cache backend
/// or a shared request manager.
///
/// # Errors
///
/// Returns [`SearchError::Config`] when `config` is invalid.
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # async fn example(
/// #     provider: Arc<dyn food_search::FoodProvider>,
/// #     rewriter: Arc<dyn food_search::QueryRewriter>,
/// # ) -> food_search::Result<()> {
/// let engine = food_search::engine(provider, rewriter, food_search::SearchConfig::default())?;
/// let response = engine.search_simple("chikcen biryani").await;
/// for candidate in &response.results {
///     println!("{}", candidate.display_name);
/// }
/// # Ok(())
/// # }
/// ```
pub fn engine(
    provider: Arc<dyn FoodProvider>,
    rewriter: Arc<dyn QueryRewriter>,
    config: SearchConfig,
) -> Result<Arc<FoodSearchEngine>> {
    Ok(Arc::new(FoodSearchEngine::new(
        provider,
        rewriter,
        CacheStore::in_memory(),
        Arc::new(RequestManager::new()),
        config,
    )?))
}
