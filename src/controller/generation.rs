use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one load. Only the most recent token is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

/// Monotonic load counter shared between the orchestrator and anything
/// that may supersede a load from another thread.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new load, making every earlier token stale.
    pub fn begin(&self) -> LoadToken {
        LoadToken(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Makes the in-flight load stale without starting another.
    pub fn cancel(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, token: LoadToken) -> bool {
        self.0.load(Ordering::SeqCst) == token.0
    }
}
