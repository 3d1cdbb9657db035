//! Per-stage timing instrumentation.
//!
//! Purely observational: a [`StageTimer`] measures one pipeline stage
//! and emits a single structured `tracing::debug!` event on finish.
//! Queries appear only at trace/debug level, never in persistent logs.

use std::time::Instant;

use crate::types::SearchStage;

/// Measures one pipeline stage for one request.
#[derive(Debug)]
pub struct StageTimer {
    request_id: u64,
    stage: SearchStage,
    query: String,
    started: Instant,
    sub_timings: Vec<(&'static str, u128)>,
}

impl StageTimer {
    pub fn start(request_id: u64, stage: SearchStage, query: &str) -> Self {
        tracing::trace!(request_id, stage = %stage, query, "stage started");
        Self {
            request_id,
            stage,
            query: query.to_string(),
            started: Instant::now(),
            sub_timings: Vec::new(),
        }
    }

    /// Record a named sub-operation's duration in milliseconds.
    pub fn record_sub(&mut self, name: &'static str, started: Instant) {
        self.sub_timings.push((name, started.elapsed().as_millis()));
    }

    /// Emit the stage event and consume the timer.
    pub fn finish(self, cache_hit: bool, results_count: usize) {
        let total_ms = self.started.elapsed().as_millis();
        tracing::debug!(
            request_id = self.request_id,
            stage = %self.stage,
            query = %self.query,
            total_ms,
            cache_hit,
            results_count,
            sub_timings = ?self.sub_timings,
            "search stage finished"
        );
    }
}
