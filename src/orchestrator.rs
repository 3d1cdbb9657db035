//! Staged search pipeline: cache → provider → optional AI rewrite.
//!
//! The orchestrator produces progressively better results while
//! guarding against out-of-order responses from rapid re-querying.
//! Every stage failure is absorbed locally; the pipeline degrades to
//! whatever results it already holds rather than failing the search.
//!
//! # Stages
//!
//! ```text
//! INIT → CACHE_CHECK → {hit: DONE}
//!                    → {miss: PROVIDER_SEARCH} → RANK → DECIDE
//!        → {strong: DONE}
//!        → {weak: emit partial + AI_REWRITE (detached)
//!             → AI_SEARCH → MERGE_RANK → DONE}
//! ```
//!
//! The AI stage runs as a detached task that outlives the caller's
//! future; it re-verifies staleness before publishing, since several
//! newer searches may have started by the time it completes.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheStore, PROVIDER_PREFIX, REWRITE_PREFIX, SEARCH_PREFIX};
use crate::config::SearchConfig;
use crate::error::Result;
use crate::normalize::{fix_common_typos, normalize_query, query_variants};
use crate::provider::{FoodProvider, QueryRewriter};
use crate::ranking::scoring::score_all;
use crate::ranking::{dedup::dedupe_results, needs_ai_fallback, sort_by_score};
use crate::request::{RequestContext, RequestManager};
use crate::telemetry::StageTimer;
use crate::types::{Candidate, QueryRewrite, SearchResponse, SearchStage};

/// The currently running AI enhancement, cancellable when a newer
/// search begins.
struct Enhancement {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Composes normalizer, cache, scorer, and request manager into the
/// staged search pipeline.
pub struct FoodSearchEngine {
    provider: Arc<dyn FoodProvider>,
    rewriter: Arc<dyn QueryRewriter>,
    cache: CacheStore,
    requests: Arc<RequestManager>,
    config: SearchConfig,
    enhancement: Mutex<Option<Enhancement>>,
}

impl std::fmt::Debug for FoodSearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoodSearchEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FoodSearchEngine {
    /// Build an engine from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SearchError::Config`] when `config` is invalid.
    pub fn new(
        provider: Arc<dyn FoodProvider>,
        rewriter: Arc<dyn QueryRewriter>,
        cache: CacheStore,
        requests: Arc<RequestManager>,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            provider,
            rewriter,
            cache,
            requests,
            config,
            enhancement: Mutex::new(None),
        })
    }

    /// The request manager issuing this engine's ids.
    pub fn request_manager(&self) -> &Arc<RequestManager> {
        &self.requests
    }

    /// Run a search with a fresh cancellation token and no progressive
    /// updates.
    pub async fn search_simple(self: &Arc<Self>, query: &str) -> SearchResponse {
        self.search(query, CancellationToken::new(), None).await
    }

    /// Run the staged search pipeline.
    ///
    /// Returns the best response available without waiting on the AI
    /// rewrite service. When the provider-stage results are weak, a
    /// detached enhancement task is launched; its improved response is
    /// delivered on `updates` only if this request is still the newest
    /// by the time it completes.
    ///
    /// Provider, rewrite, and cache failures all degrade silently; a
    /// response with zero results is a valid terminal state.
    pub async fn search(
        self: &Arc<Self>,
        query: &str,
        cancel: CancellationToken,
        updates: Option<mpsc::Sender<SearchResponse>>,
    ) -> SearchResponse {
        let trimmed = query.trim();
        if trimmed.chars().count() < self.config.min_query_length || cancel.is_cancelled() {
            return SearchResponse::empty();
        }

        let ctx = RequestContext::new(self.requests.next_id(), cancel);
        self.cancel_enhancement().await;

        let normalized = normalize_query(trimmed);
        let typo_fixed = fix_common_typos(trimmed);
        let corrected = (typo_fixed != normalized).then(|| typo_fixed.clone());

        let mut variants = query_variants(trimmed);
        variants.retain(|v| v != &typo_fixed);
        variants.truncate(self.config.max_query_variants);

        // Cache stage.
        let timer = StageTimer::start(ctx.id, SearchStage::Cache, &typo_fixed);
        let search_key = format!("{SEARCH_PREFIX}{typo_fixed}");
        if let Some(mut cached) = self.cache.get::<SearchResponse>(&search_key).await {
            if !self.requests.is_stale(ctx.id) && !ctx.is_cancelled() {
                cached.from_cache = true;
                timer.finish(true, cached.results.len());
                if let Some(tx) = &updates {
                    let _ = tx.send(cached.clone()).await;
                }
                return cached;
            }
        }
        timer.finish(false, 0);

        // Provider stage: one batched call for primary + variants.
        let mut timer = StageTimer::start(ctx.id, SearchStage::Provider, &typo_fixed);
        let call_started = Instant::now();
        let candidates = self
            .fetch_provider_results(&typo_fixed, &variants)
            .await;
        timer.record_sub("provider_call", call_started);

        // An expensive call can be made obsolete by a newer request
        // issued mid-flight.
        if ctx.is_cancelled() || self.requests.is_stale(ctx.id) {
            tracing::trace!(request_id = ctx.id, "request superseded during provider call");
            return SearchResponse::empty();
        }

        let rank_started = Instant::now();
        let mut scored = dedupe_results(score_all(candidates, &typo_fixed));
        sort_by_score(&mut scored);
        scored.truncate(self.config.max_results);
        timer.record_sub("rank", rank_started);

        let fallback = needs_ai_fallback(
            &scored,
            self.config.min_results,
            self.config.min_score_threshold,
        );

        let response = SearchResponse {
            results: scored.iter().map(|s| s.candidate.clone()).collect(),
            corrected_query: corrected.clone(),
            alternative_queries: Vec::new(),
            from_cache: false,
            ai_rewrite_used: false,
        };

        self.cache
            .set(&search_key, &response, self.config.search_ttl)
            .await;
        timer.finish(false, response.results.len());

        if let Some(tx) = &updates {
            let _ = tx.send(response.clone()).await;
        }

        if fallback {
            self.spawn_enhancement(
                ctx.clone(),
                typo_fixed.clone(),
                response.results.clone(),
                updates,
            )
            .await;
        }

        response
    }

    /// Provider call with a 24h result cache in front. Errors are
    /// logged and collapse to an empty candidate set.
    async fn fetch_provider_results(&self, primary: &str, variants: &[String]) -> Vec<Candidate> {
        let provider_key = format!("{PROVIDER_PREFIX}{primary}|{}", variants.join(","));
        if let Some(cached) = self.cache.get::<Vec<Candidate>>(&provider_key).await {
            return cached;
        }

        match self
            .provider
            .search(primary, variants, self.config.max_results)
            .await
        {
            Ok(candidates) => {
                self.cache
                    .set(&provider_key, &candidates, self.config.provider_ttl)
                    .await;
                candidates
            }
            Err(err) => {
                tracing::warn!(primary, error = %err, "provider search failed");
                Vec::new()
            }
        }
    }

    /// Cancel and drop the in-flight enhancement task, if any.
    pub async fn cancel_enhancement(&self) {
        if let Some(previous) = self.enhancement.lock().await.take() {
            previous.token.cancel();
            drop(previous.task);
        }
    }

    /// Launch the detached AI enhancement stage.
    async fn spawn_enhancement(
        self: &Arc<Self>,
        ctx: RequestContext,
        typo_fixed: String,
        prior_results: Vec<Candidate>,
        updates: Option<mpsc::Sender<SearchResponse>>,
    ) {
        let token = ctx.cancel.child_token();
        let engine = Arc::clone(self);
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            engine
                .run_enhancement(ctx, typo_fixed, prior_results, updates, task_token)
                .await;
        });

        *self.enhancement.lock().await = Some(Enhancement { token, task });
    }

    /// The AI rewrite stage: rewrite → re-check staleness → batched
    /// provider call → merge → re-rank → cache → publish if newest.
    async fn run_enhancement(
        self: Arc<Self>,
        ctx: RequestContext,
        typo_fixed: String,
        prior_results: Vec<Candidate>,
        updates: Option<mpsc::Sender<SearchResponse>>,
        token: CancellationToken,
    ) {
        let mut timer = StageTimer::start(ctx.id, SearchStage::AiEnhanced, &typo_fixed);

        let rewrite = match self.fetch_rewrite(&typo_fixed, &token).await {
            Some(rewrite) => rewrite,
            None => return,
        };

        if token.is_cancelled() || self.requests.is_stale(ctx.id) {
            tracing::trace!(request_id = ctx.id, "enhancement superseded after rewrite");
            return;
        }

        let mut alternatives = rewrite.alternative_queries.clone();
        alternatives.extend(rewrite.synonyms.iter().cloned());
        alternatives.retain(|a| !a.is_empty() && a != &rewrite.corrected_query);
        alternatives.truncate(self.config.max_query_variants);

        let call_started = Instant::now();
        let fresh = match self
            .provider
            .search(
                &rewrite.corrected_query,
                &alternatives,
                self.config.max_results,
            )
            .await
        {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(query = %rewrite.corrected_query, error = %err, "ai-stage provider search failed");
                return;
            }
        };
        timer.record_sub("provider_call", call_started);

        if token.is_cancelled() || self.requests.is_stale(ctx.id) {
            tracing::trace!(request_id = ctx.id, "enhancement superseded after provider call");
            return;
        }

        // Merge prior and fresh candidates, drop identity duplicates,
        // then re-rank everything against the corrected query.
        let mut merged = prior_results;
        for candidate in fresh {
            let duplicate = merged
                .iter()
                .any(|c| c.provider == candidate.provider && c.external_id == candidate.external_id);
            if !duplicate {
                merged.push(candidate);
            }
        }

        let rank_started = Instant::now();
        let mut scored = dedupe_results(score_all(merged, &rewrite.corrected_query));
        sort_by_score(&mut scored);
        scored.truncate(self.config.max_results);
        timer.record_sub("rank", rank_started);

        let enhanced = SearchResponse {
            results: scored.iter().map(|s| s.candidate.clone()).collect(),
            corrected_query: Some(rewrite.corrected_query),
            alternative_queries: rewrite.alternative_queries,
            from_cache: false,
            ai_rewrite_used: true,
        };

        let search_key = format!("{SEARCH_PREFIX}{typo_fixed}");
        self.cache
            .set(&search_key, &enhanced, self.config.search_ttl)
            .await;
        timer.finish(false, enhanced.results.len());

        // Publish only when this request is still the most recent.
        if self.requests.is_stale(ctx.id) || token.is_cancelled() {
            return;
        }
        if let Some(tx) = updates {
            let _ = tx.send(enhanced).await;
        }
    }

    /// Rewrite lookup with a 7d cache in front. `None` covers failures
    /// and "no useful rewrite" alike.
    async fn fetch_rewrite(
        &self,
        typo_fixed: &str,
        token: &CancellationToken,
    ) -> Option<QueryRewrite> {
        let rewrite_key = format!("{REWRITE_PREFIX}{typo_fixed}");
        if let Some(cached) = self.cache.get::<QueryRewrite>(&rewrite_key).await {
            return Some(cached);
        }

        match self.rewriter.rewrite(typo_fixed, token).await {
            Ok(Some(rewrite)) => {
                self.cache
                    .set(&rewrite_key, &rewrite, self.config.rewrite_ttl)
                    .await;
                Some(rewrite)
            }
            Ok(None) => {
                tracing::debug!(query = typo_fixed, "no useful rewrite");
                None
            }
            Err(err) => {
                tracing::warn!(query = typo_fixed, error = %err, "rewrite service failed");
                None
            }
        }
    }
}
