//! Monotonic request identifiers and staleness tracking.
//!
//! A request is stale iff its id is lower than the most recently issued
//! id. The counter only advances when a new request starts, so the
//! newest request is never stale until a newer one begins — this is the
//! sole mechanism keeping an old, slow search from overwriting a newer
//! one's results.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Issues strictly increasing request ids for the lifetime of this
/// manager. Owned and injected rather than global, so independent
/// instances can exist side by side in tests.
#[derive(Debug, Default)]
pub struct RequestManager {
    counter: AtomicU64,
}

impl RequestManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-increment and return the counter. Ids start at 1 and are
    /// never reused.
    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Id of the most recently issued request (0 before any request).
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// True once a newer request has been issued.
    pub fn is_stale(&self, id: u64) -> bool {
        id < self.current()
    }
}

/// Per-search context: the request's id plus the caller's cancellation
/// signal. Never persisted.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub id: u64,
    pub cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(id: u64, cancel: CancellationToken) -> Self {
        Self { id, cancel }
    }

    /// "Already cancelled" is treated identically to "stale": abort and
    /// keep whatever results are already held.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
