//! Content/moderation list synchronizer.
//!
//! The two list scopes map to distinct endpoints and are never merged
//! client-side. Pending fetches carry a monotonic sequence so a slow
//! response cannot overwrite a later-issued one in the retained list. Point
//! mutations reconcile against that list without a full refetch — removal
//! happens only after the server confirms, unlike the notification
//! synchronizer's read-flag optimism. Raw sources are fetched lazily per
//! item when a detail view opens.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use studyhub_client_core::client::{ApiClient, ApiClientError};
use studyhub_client_core::model::{
    AllContentsResponse, ContentItem, ModerateRequest, PendingContentsResponse,
    RawContentResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Pending,
    All,
}

impl ListScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Default)]
struct PendingState {
    items: Vec<ContentItem>,
    issue_seq: u64,
    applied_seq: u64,
}

pub struct ModerationSync {
    client: Arc<ApiClient>,
    pending: Mutex<PendingState>,
}

impl ModerationSync {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            pending: Mutex::new(PendingState::default()),
        }
    }

    /// Last fetched pending queue, in server-assigned order.
    pub fn pending_items(&self) -> Vec<ContentItem> {
        self.lock_pending().items.clone()
    }

    /// Fetch one scope's list. The pending result is retained for point
    /// mutations; the "all" scope is pass-through.
    pub async fn fetch(&self, scope: ListScope) -> Result<Vec<ContentItem>, ApiClientError> {
        match scope {
            ListScope::Pending => {
                let seq = self.next_pending_seq();
                let payload = self
                    .client
                    .get_payload::<PendingContentsResponse>(ApiClient::moderation_pending_path())
                    .await?;
                self.apply_pending(seq, payload.pending_contents.clone());
                Ok(payload.pending_contents)
            }
            ListScope::All => {
                let payload = self
                    .client
                    .get_payload::<AllContentsResponse>(ApiClient::moderation_all_path())
                    .await?;
                Ok(payload.all_contents)
            }
        }
    }

    pub async fn approve(&self, content_id: &str) -> Result<String, ApiClientError> {
        self.moderate(content_id, true).await
    }

    pub async fn reject(&self, content_id: &str) -> Result<String, ApiClientError> {
        self.moderate(content_id, false).await
    }

    /// Submit a moderation decision; returns the backend's confirmation
    /// message. Only after the server confirms is the item removed from the
    /// retained pending list; on failure the list is untouched.
    pub async fn moderate(&self, content_id: &str, approve: bool) -> Result<String, ApiClientError> {
        let path = ApiClient::moderation_moderate_path(content_id);
        let envelope = self
            .client
            .put_json_envelope(&path, &ModerateRequest { approve })
            .await?
            .ensure_success()?;

        self.lock_pending()
            .items
            .retain(|item| item.id != content_id);
        Ok(envelope.msg)
    }

    /// Lazy per-item raw-source fetch for the detail view; never issued as
    /// part of the list fetch.
    pub async fn fetch_raw(&self, source_key: &str) -> Result<String, ApiClientError> {
        let payload = self
            .client
            .get_payload::<RawContentResponse>(&ApiClient::moderation_raw_path(source_key))
            .await?;
        Ok(payload.raw_content)
    }

    fn next_pending_seq(&self) -> u64 {
        let mut pending = self.lock_pending();
        pending.issue_seq += 1;
        pending.issue_seq
    }

    fn apply_pending(&self, seq: u64, items: Vec<ContentItem>) {
        let mut pending = self.lock_pending();
        if seq <= pending.applied_seq {
            debug!(seq, "discarding stale pending list response");
            return;
        }
        pending.applied_seq = seq;
        pending.items = items;
    }

    fn lock_pending(&self) -> MutexGuard<'_, PendingState> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use studyhub_client_core::client::ApiClientConfig;
    use studyhub_client_core::model::ContentKind;

    fn offline_moderation() -> ModerationSync {
        let client = Arc::new(
            ApiClient::new(ApiClientConfig::new("http://127.0.0.1:9")).expect("api client"),
        );
        ModerationSync::new(client)
    }

    fn content(id: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            user_id: "usr_1".to_string(),
            topic: "Cell biology".to_string(),
            kind: ContentKind::Quiz,
            created_at: Utc.with_ymd_and_hms(2026, 8, 2, 8, 0, 0).unwrap(),
            source_key: None,
            content_url: None,
        }
    }

    #[test]
    fn stale_pending_responses_are_discarded() {
        let moderation = offline_moderation();

        let early = moderation.next_pending_seq();
        let late = moderation.next_pending_seq();

        // The later-issued fetch resolves first; the earlier one must not
        // overwrite it.
        moderation.apply_pending(late, vec![content("cnt_a"), content("cnt_b")]);
        moderation.apply_pending(early, vec![content("cnt_stale")]);

        let items = moderation.pending_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "cnt_a");
    }
}
