//! Client-side state reconciliation for the Studyhub backend.
//!
//! Each synchronizer exclusively owns its slice of state: notifications
//! ([`notifications::NotificationSync`]), billing ([`billing::BillingSync`]),
//! and the moderation queue ([`moderation::ModerationSync`]). The identity
//! resolver gates mutations behind an established session, and the refresh
//! epoch is the one cross-synchronizer signal. Consumers tie polling to
//! their own lifetime through a [`scope::SyncScope`].

pub mod billing;
pub mod config;
pub mod epoch;
pub mod error;
pub mod identity;
pub mod moderation;
pub mod notice;
pub mod notifications;
pub mod scope;

pub use billing::{BillingSync, BillingView};
pub use config::SyncConfig;
pub use epoch::{EpochObserver, RefreshEpoch};
pub use error::SyncError;
pub use identity::{IdentityError, IdentityProvider, IdentityResolver};
pub use moderation::{ListScope, ModerationSync};
pub use notice::{NoticeSeverity, UserNotice};
pub use notifications::NotificationSync;
pub use scope::{ScopeToken, SyncScope};
