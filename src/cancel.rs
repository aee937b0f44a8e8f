//! Cooperative cancellation for in-flight searches.
//!
//! A caller-supplied token lets `SearchEngine::search` abort between major
//! pipeline steps (filter, vector search, traversal) without returning
//! partial results. There is no cooperative yield point inside the
//! vector-distance loop itself — only between steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply cloned, thread-safe cancellation flag.
///
/// Cloning shares the same underlying flag; cancelling any clone cancels
/// all of them.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True if [`cancel`](Self::cancel) has been called on this token or
    /// any of its clones.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
