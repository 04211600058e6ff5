//! Process-wide refresh signal for plan-dependent UI regions.
//!
//! The epoch is append-only: written by `bump`, read-compared everywhere
//! else, never reset. An explicit handle is threaded through constructors so
//! no global survives across test runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default)]
pub struct RefreshEpoch {
    counter: Arc<AtomicU64>,
}

impl RefreshEpoch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic increment; returns the new epoch value.
    pub fn bump(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

/// Per-consumer view over a [`RefreshEpoch`]; staleness is a plain
/// greater-than comparison against the last value the consumer acted on.
#[derive(Debug)]
pub struct EpochObserver {
    epoch: RefreshEpoch,
    last_seen: AtomicU64,
}

impl EpochObserver {
    #[must_use]
    pub fn new(epoch: &RefreshEpoch) -> Self {
        Self {
            epoch: epoch.clone(),
            last_seen: AtomicU64::new(epoch.current()),
        }
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.epoch.current() > self.last_seen.load(Ordering::SeqCst)
    }

    pub fn mark_seen(&self) {
        self.last_seen.store(self.epoch.current(), Ordering::SeqCst);
    }
}
