//! Consumer-lifetime scope for background sync work.
//!
//! Dropping the scope aborts the polling tasks it owns and marks the token
//! dead. In-flight requests already issued are not aborted; continuations
//! that still resolve check [`ScopeToken::is_live`] and no-op.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct ScopeToken {
    live: Arc<AtomicBool>,
}

impl ScopeToken {
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct SyncScope {
    live: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncScope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn token(&self) -> ScopeToken {
        ScopeToken {
            live: Arc::clone(&self.live),
        }
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handle);
    }
}

impl Default for SyncScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SyncScope {
    fn drop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        let tasks = self
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .split_off(0);
        for task in tasks {
            task.abort();
        }
    }
}
