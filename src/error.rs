//! Error types for the food-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No error here is fatal to a search: the
//! orchestrator recovers from every variant locally and degrades to
//! whatever results it already has.

/// Errors that can occur during food search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The nutrition provider backend failed (network or backend error).
    /// Recovered by treating the call as having returned zero results.
    #[error("provider error: {0}")]
    Provider(String),

    /// The AI query-rewrite service failed, timed out, or returned a
    /// malformed response. Recovered by skipping the enhancement stage.
    #[error("rewrite service error: {0}")]
    Rewrite(String),

    /// The cache backend failed to read, write, or serialize an entry.
    /// Recovered by proceeding without the cache.
    #[error("cache error: {0}")]
    Cache(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for food-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
