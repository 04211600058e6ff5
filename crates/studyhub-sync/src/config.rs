use std::time::Duration;

pub const DEFAULT_NOTIFICATION_PAGE_SIZE: usize = 20;
pub const DEFAULT_UNREAD_POLL_MS: u64 = 10_000;
pub const DEFAULT_ARRIVAL_PULSE_MS: u64 = 5_000;
pub const DEFAULT_IDENTITY_SETTLE_MS: u64 = 300;

/// Tunables shared by the synchronizers. Tests shrink the durations; the
/// defaults match production behavior.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How many notifications a list fetch requests.
    pub notification_page_size: usize,
    /// Unread-count re-fetch interval while a consumer is mounted.
    pub unread_poll: Duration,
    /// How long the "new notification arrived" flag stays set.
    pub arrival_pulse: Duration,
    /// Pause before trusting the identity provider's synchronous shortcut.
    pub identity_settle: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            notification_page_size: DEFAULT_NOTIFICATION_PAGE_SIZE,
            unread_poll: Duration::from_millis(DEFAULT_UNREAD_POLL_MS),
            arrival_pulse: Duration::from_millis(DEFAULT_ARRIVAL_PULSE_MS),
            identity_settle: Duration::from_millis(DEFAULT_IDENTITY_SETTLE_MS),
        }
    }
}
