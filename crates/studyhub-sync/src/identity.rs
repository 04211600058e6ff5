//! Best-effort resolution of the current authenticated identity.
//!
//! Resolution is memoized as a shared future: concurrent callers during the
//! resolution window receive the same eventual result, so at most one
//! resolution is in flight regardless of call count. Provider failures
//! resolve to absence; callers never need a failure branch.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::debug;

use studyhub_client_core::model::IdentityHandle;

use crate::config::SyncConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("identity_provider_unavailable:{0}")]
    Unavailable(String),
}

/// Seam over the identity provider: a synchronous "current identity"
/// shortcut and a one-shot identity-change subscription that delivers once
/// (success or explicit absence) and is then done.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Result<Option<IdentityHandle>, IdentityError>;

    async fn wait_identity_changed(&self) -> Result<Option<IdentityHandle>, IdentityError>;
}

type SharedResolution = Shared<BoxFuture<'static, Option<IdentityHandle>>>;

pub struct IdentityResolver {
    provider: Arc<dyn IdentityProvider>,
    settle: Duration,
    memoized: Mutex<Option<SharedResolution>>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, config: &SyncConfig) -> Self {
        Self {
            provider,
            settle: config.identity_settle,
            memoized: Mutex::new(None),
        }
    }

    /// Resolve the session identity, sharing any resolution already in
    /// flight or settled.
    pub async fn resolve(&self) -> Option<IdentityHandle> {
        self.resolution().await
    }

    /// Drop the memoized resolution so the next `resolve` starts over.
    pub fn invalidate(&self) {
        let mut memoized = self
            .memoized
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *memoized = None;
    }

    fn resolution(&self) -> SharedResolution {
        let mut memoized = self
            .memoized
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = memoized.as_ref() {
            return existing.clone();
        }

        let provider = Arc::clone(&self.provider);
        let settle = self.settle;
        let resolution = async move {
            // The provider may still be initializing; give it a moment
            // before trusting the synchronous shortcut.
            tokio::time::sleep(settle).await;

            match provider.current_identity() {
                Ok(Some(handle)) => return Some(handle),
                Ok(None) => {}
                Err(error) => {
                    debug!("identity shortcut unavailable: {error}");
                }
            }

            match provider.wait_identity_changed().await {
                Ok(handle) => handle,
                Err(error) => {
                    debug!("identity subscription failed: {error}");
                    None
                }
            }
        }
        .boxed()
        .shared();

        *memoized = Some(resolution.clone());
        resolution
    }
}
