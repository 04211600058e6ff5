//! Notification synchronizer.
//!
//! Owns the local notification list, the unread count, and the transient
//! "new notification arrived" pulse. List and count fetches are background
//! noise: failures are logged and swallowed, never surfaced. Mutations are
//! optimistic commands — applied locally first, committed on server
//! confirmation, compensated and reported through the notice channel on
//! confirmed failure.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use studyhub_client_core::client::ApiClient;
use studyhub_client_core::model::{
    MarkAllReadResponse, Notification, NotificationListResponse, UnreadCountResponse,
};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::identity::IdentityResolver;
use crate::notice::UserNotice;
use crate::scope::{ScopeToken, SyncScope};

#[derive(Debug, Default)]
struct NotificationState {
    items: Vec<Notification>,
    unread_count: u64,
    /// `None` until the first count fetch lands; the initial baseline never
    /// fires the arrival pulse.
    previous_count: Option<u64>,
    new_arrival: bool,
    pulse_generation: u64,
    list_issue_seq: u64,
    list_applied_seq: u64,
    count_issue_seq: u64,
    count_applied_seq: u64,
}

/// Pre-state recorded by `mark_as_read` so a confirmed failure can be
/// compensated.
struct ReadRevert {
    flipped: bool,
    decremented: bool,
}

struct MarkAllRevert {
    unread_ids: Vec<String>,
    previous_count: u64,
}

pub struct NotificationSync {
    client: Arc<ApiClient>,
    config: SyncConfig,
    identity: Option<Arc<IdentityResolver>>,
    state: Arc<Mutex<NotificationState>>,
    notices: UnboundedSender<UserNotice>,
    /// Token of the scope driving the poll loop; the detached pulse-clear
    /// task checks it so no state mutation lands after unmount.
    poll_token: Mutex<Option<ScopeToken>>,
}

impl NotificationSync {
    pub fn new(
        client: Arc<ApiClient>,
        config: SyncConfig,
    ) -> (Arc<Self>, UnboundedReceiver<UserNotice>) {
        let (notices, receiver) = mpsc::unbounded_channel();
        let sync = Arc::new(Self {
            client,
            config,
            identity: None,
            state: Arc::new(Mutex::new(NotificationState::default())),
            notices,
            poll_token: Mutex::new(None),
        });
        (sync, receiver)
    }

    /// Gate mutations behind an established session.
    pub fn with_identity(
        client: Arc<ApiClient>,
        config: SyncConfig,
        identity: Arc<IdentityResolver>,
    ) -> (Arc<Self>, UnboundedReceiver<UserNotice>) {
        let (notices, receiver) = mpsc::unbounded_channel();
        let sync = Arc::new(Self {
            client,
            config,
            identity: Some(identity),
            state: Arc::new(Mutex::new(NotificationState::default())),
            notices,
            poll_token: Mutex::new(None),
        });
        (sync, receiver)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock_state().items.clone()
    }

    pub fn unread_count(&self) -> u64 {
        self.lock_state().unread_count
    }

    pub fn has_new_arrival(&self) -> bool {
        self.lock_state().new_arrival
    }

    /// Fetch the most recent page and replace the local list wholesale.
    /// Failures leave the prior list intact.
    pub async fn fetch_notifications(&self) {
        let seq = self.next_list_seq();
        let path = ApiClient::notifications_path(self.config.notification_page_size);
        match self
            .client
            .get_payload::<NotificationListResponse>(&path)
            .await
        {
            Ok(payload) => self.apply_notifications(seq, payload.notifications),
            Err(error) => debug!("notification list fetch failed: {error}"),
        }
    }

    /// Fetch the unread count and run the arrival-pulse transition.
    /// Failures leave the prior count intact.
    pub async fn fetch_unread_count(&self) {
        let seq = self.next_count_seq();
        match self
            .client
            .get_payload::<UnreadCountResponse>(ApiClient::unread_count_path())
            .await
        {
            Ok(payload) => self.observe_unread_count(seq, payload.unread_count),
            Err(error) => debug!("unread count fetch failed: {error}"),
        }
    }

    /// Initial fetch of list and count, then count re-fetches on the
    /// configured interval for the scope's lifetime.
    pub fn start_polling(self: &Arc<Self>, scope: &SyncScope) {
        let sync = Arc::clone(self);
        let token = scope.token();
        *self.lock_poll_token() = Some(scope.token());
        let poll = self.config.unread_poll;
        scope.spawn(async move {
            sync.fetch_notifications().await;
            sync.fetch_unread_count().await;

            let mut ticker = tokio::time::interval(poll);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; the mount-time fetch
            // above already covered it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !token.is_live() {
                    break;
                }
                sync.fetch_unread_count().await;
            }
        });
    }

    /// Optimistically flip the read flag and decrement the count (floored at
    /// zero), then confirm with the server. A confirmed failure compensates
    /// the local mutation and raises a user notice.
    pub async fn mark_as_read(&self, notification_id: &str) -> Result<(), SyncError> {
        self.require_identity().await?;

        let revert = {
            let mut state = self.lock_state();
            let flipped = match state
                .items
                .iter_mut()
                .find(|item| item.id == notification_id)
            {
                Some(item) if !item.read => {
                    item.read = true;
                    true
                }
                _ => false,
            };
            let decremented = state.unread_count > 0;
            state.unread_count = state.unread_count.saturating_sub(1);
            ReadRevert { flipped, decremented }
        };

        let path = ApiClient::notification_read_path(notification_id);
        match self.client.put_ack(&path).await {
            Ok(()) => Ok(()),
            Err(error) => {
                let mut state = self.lock_state();
                if revert.flipped {
                    if let Some(item) = state
                        .items
                        .iter_mut()
                        .find(|item| item.id == notification_id)
                    {
                        item.read = false;
                    }
                }
                if revert.decremented {
                    state.unread_count += 1;
                }
                drop(state);
                self.push_notice(UserNotice::error(format!(
                    "failed to mark notification as read: {error}"
                )));
                Err(error.into())
            }
        }
    }

    /// Optimistically mark every local item read and zero the count, then
    /// confirm. On success the server's authoritative updated count is
    /// reported through the notice channel.
    pub async fn mark_all_as_read(&self) -> Result<u64, SyncError> {
        self.require_identity().await?;

        let revert = {
            let mut state = self.lock_state();
            let unread_ids = state
                .items
                .iter()
                .filter(|item| !item.read)
                .map(|item| item.id.clone())
                .collect::<Vec<_>>();
            for item in &mut state.items {
                item.read = true;
            }
            let previous_count = state.unread_count;
            state.unread_count = 0;
            MarkAllRevert {
                unread_ids,
                previous_count,
            }
        };

        match self
            .client
            .put_payload::<MarkAllReadResponse>(ApiClient::mark_all_read_path())
            .await
        {
            Ok(payload) => {
                self.push_notice(UserNotice::success(format!(
                    "{} notifications marked as read",
                    payload.notifications_updated
                )));
                Ok(payload.notifications_updated)
            }
            Err(error) => {
                let mut state = self.lock_state();
                for item in &mut state.items {
                    if revert.unread_ids.contains(&item.id) {
                        item.read = false;
                    }
                }
                state.unread_count = revert.previous_count;
                drop(state);
                self.push_notice(UserNotice::error(format!(
                    "failed to mark all notifications as read: {error}"
                )));
                Err(error.into())
            }
        }
    }

    /// Count transition: a strict increase over a non-baseline previous
    /// value sets the arrival flag and (re-)arms the auto-clear pulse. The
    /// generation token keeps exactly one pending clear; re-arming resets it.
    fn observe_unread_count(&self, seq: u64, new_count: u64) {
        let armed_generation = {
            let mut state = self.lock_state();
            if seq <= state.count_applied_seq {
                debug!(seq, "discarding stale unread count response");
                return;
            }
            state.count_applied_seq = seq;
            let increased = matches!(state.previous_count, Some(previous) if new_count > previous);
            state.previous_count = Some(new_count);
            state.unread_count = new_count;
            if increased {
                state.new_arrival = true;
                state.pulse_generation += 1;
                Some(state.pulse_generation)
            } else {
                None
            }
        };

        if let Some(generation) = armed_generation {
            let state = Arc::clone(&self.state);
            let pulse = self.config.arrival_pulse;
            let token = self.lock_poll_token().clone();
            tokio::spawn(async move {
                tokio::time::sleep(pulse).await;
                // The consumer driving the poll loop may have unmounted
                // while the pulse was pending; leave its state alone.
                if token.is_some_and(|token| !token.is_live()) {
                    return;
                }
                let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if state.pulse_generation == generation {
                    state.new_arrival = false;
                }
            });
        }
    }

    fn next_list_seq(&self) -> u64 {
        let mut state = self.lock_state();
        state.list_issue_seq += 1;
        state.list_issue_seq
    }

    fn apply_notifications(&self, seq: u64, items: Vec<Notification>) {
        let mut state = self.lock_state();
        if seq <= state.list_applied_seq {
            debug!(seq, "discarding stale notification list response");
            return;
        }
        state.list_applied_seq = seq;
        state.items = items;
    }

    fn next_count_seq(&self) -> u64 {
        let mut state = self.lock_state();
        state.count_issue_seq += 1;
        state.count_issue_seq
    }

    async fn require_identity(&self) -> Result<(), SyncError> {
        if let Some(resolver) = &self.identity {
            if resolver.resolve().await.is_none() {
                self.push_notice(UserNotice::info("please sign in to continue"));
                return Err(SyncError::NoIdentity);
            }
        }
        Ok(())
    }

    fn push_notice(&self, notice: UserNotice) {
        // Consumers may have dropped the receiver; nothing to do then.
        let _ = self.notices.send(notice);
    }

    fn lock_state(&self) -> MutexGuard<'_, NotificationState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_poll_token(&self) -> MutexGuard<'_, Option<ScopeToken>> {
        self.poll_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use studyhub_client_core::client::ApiClientConfig;
    use studyhub_client_core::model::NotificationSeverity;

    fn offline_sync(config: SyncConfig) -> Arc<NotificationSync> {
        let client = Arc::new(
            ApiClient::new(ApiClientConfig::new("http://127.0.0.1:9")).expect("api client"),
        );
        NotificationSync::new(client, config).0
    }

    fn observe(sync: &NotificationSync, count: u64) {
        let seq = sync.next_count_seq();
        sync.observe_unread_count(seq, count);
    }

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            title: "Quiz graded".to_string(),
            message: "Your photosynthesis quiz was graded".to_string(),
            severity: NotificationSeverity::Success,
            read: false,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 15, 0).unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn baseline_count_never_fires_the_arrival_flag() {
        let sync = offline_sync(SyncConfig::default());

        observe(&sync, 3);
        assert_eq!(sync.unread_count(), 3);
        assert!(!sync.has_new_arrival());
    }

    #[tokio::test(start_paused = true)]
    async fn flag_fires_exactly_once_for_sequence_zero_three_three_five() {
        let sync = offline_sync(SyncConfig::default());

        observe(&sync, 3);
        assert!(!sync.has_new_arrival());

        observe(&sync, 3);
        assert!(!sync.has_new_arrival());

        observe(&sync, 5);
        assert!(sync.has_new_arrival());
    }

    #[tokio::test(start_paused = true)]
    async fn arrival_flag_auto_clears_after_the_pulse() {
        let sync = offline_sync(SyncConfig::default());

        observe(&sync, 3);
        assert!(!sync.has_new_arrival());
        observe(&sync, 3);
        assert!(!sync.has_new_arrival());
        observe(&sync, 7);
        assert!(sync.has_new_arrival());

        tokio::time::sleep(Duration::from_millis(
            crate::config::DEFAULT_ARRIVAL_PULSE_MS + 50,
        ))
        .await;
        assert!(!sync.has_new_arrival());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_resets_the_pending_clear() {
        let sync = offline_sync(SyncConfig::default());
        let pulse = Duration::from_millis(crate::config::DEFAULT_ARRIVAL_PULSE_MS);

        observe(&sync, 1);
        observe(&sync, 2);
        assert!(sync.has_new_arrival());

        // Halfway through the pulse a further increase re-arms the timer.
        tokio::time::sleep(pulse / 2).await;
        observe(&sync, 4);
        assert!(sync.has_new_arrival());

        // The original timer's deadline passes; the re-armed one has not.
        tokio::time::sleep(pulse * 3 / 4).await;
        assert!(sync.has_new_arrival());

        tokio::time::sleep(pulse / 2).await;
        assert!(!sync.has_new_arrival());
    }

    #[tokio::test(start_paused = true)]
    async fn decreases_and_repeats_do_not_fire() {
        let sync = offline_sync(SyncConfig::default());

        observe(&sync, 5);
        observe(&sync, 2);
        assert!(!sync.has_new_arrival());
        observe(&sync, 2);
        assert!(!sync.has_new_arrival());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_count_responses_are_discarded() {
        let sync = offline_sync(SyncConfig::default());

        let early = sync.next_count_seq();
        let late = sync.next_count_seq();

        // The later-issued fetch resolves first; the earlier one must not
        // overwrite it.
        sync.observe_unread_count(late, 6);
        sync.observe_unread_count(early, 2);
        assert_eq!(sync.unread_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_list_responses_are_discarded() {
        let sync = offline_sync(SyncConfig::default());

        let early = sync.next_list_seq();
        let late = sync.next_list_seq();

        // The later-issued fetch resolves first; the earlier one must not
        // overwrite it.
        sync.apply_notifications(late, vec![notification("ntf_1"), notification("ntf_2")]);
        sync.apply_notifications(early, vec![notification("ntf_stale")]);

        let items = sync.notifications();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "ntf_1");
    }

    #[tokio::test(start_paused = true)]
    async fn pulse_clear_does_not_run_after_the_polling_scope_drops() {
        let sync = offline_sync(SyncConfig::default());
        let scope = SyncScope::new();
        *sync.lock_poll_token() = Some(scope.token());

        observe(&sync, 1);
        observe(&sync, 3);
        assert!(sync.has_new_arrival());

        drop(scope);
        tokio::time::sleep(Duration::from_millis(
            crate::config::DEFAULT_ARRIVAL_PULSE_MS + 50,
        ))
        .await;
        assert!(sync.has_new_arrival());
    }
}
