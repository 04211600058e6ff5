//! Subscription status synchronizer.
//!
//! "Not yet loaded" and "confirmed no subscription" are different states;
//! [`BillingView`] keeps the distinction in the type. Status fetches carry a
//! monotonic sequence so a slow response that lost the race to a
//! later-issued fetch cannot overwrite the newer view. The synchronizer also
//! owns the shared refresh epoch used to tell unrelated plan-dependent UI
//! regions to re-fetch after checkout or cancellation.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use studyhub_client_core::client::{ApiClient, ApiClientError};
use studyhub_client_core::model::{
    BillingStatusResponse, CheckoutHandle, CheckoutSessionRequest, SubscriptionStatus,
};

use crate::epoch::RefreshEpoch;

#[derive(Debug, Clone, PartialEq)]
pub enum BillingView {
    /// No status fetch has resolved yet.
    Loading,
    /// The backend confirmed there is no active subscription.
    NoSubscription,
    Subscribed(SubscriptionStatus),
}

#[derive(Debug)]
struct BillingState {
    view: BillingView,
    issue_seq: u64,
    applied_seq: u64,
}

pub struct BillingSync {
    client: Arc<ApiClient>,
    epoch: RefreshEpoch,
    state: Mutex<BillingState>,
}

impl BillingSync {
    #[must_use]
    pub fn new(client: Arc<ApiClient>, epoch: RefreshEpoch) -> Self {
        Self {
            client,
            epoch,
            state: Mutex::new(BillingState {
                view: BillingView::Loading,
                issue_seq: 0,
                applied_seq: 0,
            }),
        }
    }

    #[must_use]
    pub fn view(&self) -> BillingView {
        self.lock_state().view.clone()
    }

    #[must_use]
    pub fn epoch(&self) -> &RefreshEpoch {
        &self.epoch
    }

    /// Fetch the subscription status. An absent subscription is a valid
    /// outcome, not an error; fetch failures leave the cached view alone.
    /// Returns the view after the response is reconciled, which may come
    /// from a later-issued fetch that already landed.
    pub async fn refresh_status(&self) -> Result<BillingView, ApiClientError> {
        let seq = self.next_status_seq();
        let payload = self
            .client
            .get_payload::<BillingStatusResponse>(ApiClient::billing_status_path())
            .await?;
        let view = match payload.subscription {
            Some(subscription) => BillingView::Subscribed(subscription),
            None => BillingView::NoSubscription,
        };
        self.apply_status(seq, view);
        Ok(self.view())
    }

    /// Start an external payment flow; returns the redirect target and the
    /// pending-subscription reference.
    pub async fn create_checkout(
        &self,
        plan_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutHandle, ApiClientError> {
        let request = CheckoutSessionRequest {
            plan_id,
            success_url,
            cancel_url,
        };
        self.client
            .post_json(ApiClient::billing_subscribe_path(), &request)
            .await
    }

    /// Request cancellation; returns the backend's confirmation message.
    /// The cached view is deliberately untouched — callers re-fetch.
    pub async fn cancel_subscription(&self) -> Result<String, ApiClientError> {
        let envelope = self
            .client
            .post_json_envelope(ApiClient::billing_cancel_path(), &serde_json::json!({}))
            .await?
            .ensure_success()?;
        Ok(envelope.msg)
    }

    /// Signal every observer of the shared epoch that plan-dependent state
    /// changed; returns the new epoch value.
    pub fn trigger_refresh(&self) -> u64 {
        self.epoch.bump()
    }

    fn next_status_seq(&self) -> u64 {
        let mut state = self.lock_state();
        state.issue_seq += 1;
        state.issue_seq
    }

    fn apply_status(&self, seq: u64, view: BillingView) {
        let mut state = self.lock_state();
        if seq <= state.applied_seq {
            debug!(seq, "discarding stale billing status response");
            return;
        }
        state.applied_seq = seq;
        state.view = view;
    }

    fn lock_state(&self) -> MutexGuard<'_, BillingState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch::EpochObserver;
    use chrono::{TimeZone, Utc};
    use studyhub_client_core::client::ApiClientConfig;
    use studyhub_client_core::model::SubscriptionState;

    fn offline_billing() -> BillingSync {
        let client = Arc::new(
            ApiClient::new(ApiClientConfig::new("http://127.0.0.1:9")).expect("api client"),
        );
        BillingSync::new(client, RefreshEpoch::new())
    }

    fn active_subscription() -> SubscriptionStatus {
        SubscriptionStatus {
            id: "sub_1".to_string(),
            user_id: "usr_1".to_string(),
            plan_id: "plan_pro".to_string(),
            status: SubscriptionState::Active,
            current_period_start: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
            current_period_end: Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap(),
            cancel_at: None,
        }
    }

    #[test]
    fn view_starts_loading() {
        assert_eq!(offline_billing().view(), BillingView::Loading);
    }

    #[test]
    fn stale_status_responses_are_discarded() {
        let billing = offline_billing();

        let early = billing.next_status_seq();
        let late = billing.next_status_seq();

        // The later-issued fetch resolves first; the earlier one must not
        // overwrite it.
        billing.apply_status(late, BillingView::Subscribed(active_subscription()));
        billing.apply_status(early, BillingView::NoSubscription);
        assert_eq!(
            billing.view(),
            BillingView::Subscribed(active_subscription())
        );
    }

    #[test]
    fn trigger_refresh_reaches_unrelated_observers() {
        let epoch = RefreshEpoch::new();
        let header_badge = EpochObserver::new(&epoch);
        let client = Arc::new(
            ApiClient::new(ApiClientConfig::new("http://127.0.0.1:9")).expect("api client"),
        );
        let billing = BillingSync::new(client, epoch);

        assert!(!header_badge.is_stale());
        billing.trigger_refresh();
        assert!(header_badge.is_stale());
    }
}
