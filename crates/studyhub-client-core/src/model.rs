//! Data model and per-endpoint wire payloads.
//!
//! Payload structs deserialize out of the envelope's `data` field; field
//! names follow the backend's snake_case wire shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationSeverity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Created server-side, fetched read-only; the only client-side mutation is
/// the read-flag flip, confirmed by the server after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub severity: NotificationSeverity,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Active,
    Canceled,
    PastDue,
    Incomplete,
}

impl SubscriptionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::PastDue => "past_due",
            Self::Incomplete => "incomplete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionState,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Quiz,
    Flashcards,
    Slides,
}

impl ContentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Flashcards => "flashcards",
            Self::Slides => "slides",
        }
    }
}

/// Generic generated-content record (quiz, flashcard deck, slide deck) as it
/// appears in content and moderation lists. Ids are unique within a fetched
/// list; list order is server-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub user_id: String,
    pub topic: String,
    pub kind: ContentKind,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
}

/// Opaque reference to the current session's user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityHandle {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Redirect target plus pending-subscription reference returned when a
/// checkout session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutHandle {
    pub redirect_url: String,
    pub pending_subscription_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSessionRequest<'a> {
    pub plan_id: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModerateRequest {
    pub approve: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MarkAllReadResponse {
    pub notifications_updated: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingStatusResponse {
    #[serde(default)]
    pub subscription: Option<SubscriptionStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingContentsResponse {
    pub pending_contents: Vec<ContentItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllContentsResponse {
    pub all_contents: Vec<ContentItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawContentResponse {
    pub raw_content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub chat_id: Option<String>,
}
