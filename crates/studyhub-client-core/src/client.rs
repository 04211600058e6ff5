//! HTTP adapter for the Studyhub REST API.
//!
//! Wraps outbound calls, tags each request with an `x-request-id`, and
//! normalizes every reply into the [`ApiEnvelope`] shape. No retries and no
//! extra timeout live here; retry policy belongs to callers and the
//! transport's defaults apply.

use reqwest::StatusCode;
use reqwest::multipart::Form;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::chat::{ChatRequest, ChatRequestError};
use crate::config::{ConfigError, resolve_api_base_url};
use crate::envelope::ApiEnvelope;
use crate::model::ChatReply;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("api_base_url_missing")]
    BaseUrlMissing,
    #[error("api_invalid_path")]
    InvalidPath,
    #[error("api_request_failed:{message}")]
    Transport { message: String },
    #[error("api_read_failed:{message}")]
    Read { message: String },
    #[error("api_http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("api_backend_error:{msg}")]
    Backend { msg: String },
    #[error("api_json_decode_failed:{message}")]
    Decode { message: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Chat(#[from] ChatRequestError),
}

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
}

impl ApiClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiClientError> {
        let trimmed = config.base_url.trim();
        if trimmed.is_empty() {
            return Err(ApiClientError::BaseUrlMissing);
        }
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        })
    }

    /// Build a client from `STUDYHUB_API_BASE_URL` (with legacy and
    /// default-local fallbacks).
    pub fn from_env() -> Result<Self, ApiClientError> {
        let (base_url, _source) = resolve_api_base_url()?;
        Self::new(ApiClientConfig::new(base_url))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    #[must_use]
    pub fn notifications_path(size: usize) -> String {
        format!("/api/v1/user/notifications?size={size}")
    }

    #[must_use]
    pub fn unread_count_path() -> &'static str {
        "/api/v1/user/notifications/unread-count"
    }

    #[must_use]
    pub fn notification_read_path(notification_id: &str) -> String {
        format!(
            "/api/v1/user/notifications/{}/read",
            notification_id.trim()
        )
    }

    #[must_use]
    pub fn mark_all_read_path() -> &'static str {
        "/api/v1/user/notifications/mark-all-read"
    }

    #[must_use]
    pub fn billing_status_path() -> &'static str {
        "/api/v1/billing/status"
    }

    #[must_use]
    pub fn billing_subscribe_path() -> &'static str {
        "/api/v1/billing/subscribe"
    }

    #[must_use]
    pub fn billing_cancel_path() -> &'static str {
        "/api/v1/billing/cancel"
    }

    #[must_use]
    pub fn moderation_pending_path() -> &'static str {
        "/api/v1/content-moderator/pending"
    }

    #[must_use]
    pub fn moderation_all_path() -> &'static str {
        "/api/v1/content-moderator/all"
    }

    #[must_use]
    pub fn moderation_raw_path(source_key: &str) -> String {
        format!("/api/v1/content-moderator/raw/{}", source_key.trim())
    }

    #[must_use]
    pub fn moderation_moderate_path(content_id: &str) -> String {
        format!("/api/v1/content-moderator/{}/moderate", content_id.trim())
    }

    #[must_use]
    pub fn chat_path() -> &'static str {
        "/api/v1/ai/chat"
    }

    pub async fn get_envelope(&self, path: &str) -> Result<ApiEnvelope, ApiClientError> {
        let url = self.url(path)?;
        self.send(self.http.get(url)).await
    }

    pub async fn put_envelope(&self, path: &str) -> Result<ApiEnvelope, ApiClientError> {
        let url = self.url(path)?;
        self.send(self.http.put(url)).await
    }

    pub async fn put_json_envelope<B>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiEnvelope, ApiClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        self.send(self.http.put(url).json(body)).await
    }

    pub async fn post_json_envelope<B>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiEnvelope, ApiClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        self.send(self.http.post(url).json(body)).await
    }

    pub async fn post_multipart_envelope(
        &self,
        path: &str,
        form: Form,
    ) -> Result<ApiEnvelope, ApiClientError> {
        let url = self.url(path)?;
        self.send(self.http.post(url).multipart(form)).await
    }

    pub async fn get_payload<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        self.get_envelope(path).await?.into_payload()
    }

    pub async fn put_payload<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        self.put_envelope(path).await?.into_payload()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_json_envelope(path, body).await?.into_payload()
    }

    /// PUT where only the success/error outcome matters.
    pub async fn put_ack(&self, path: &str) -> Result<(), ApiClientError> {
        self.put_envelope(path).await?.ensure_success().map(|_| ())
    }

    pub async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ApiClientError> {
        let form = request.into_form()?;
        self.post_multipart_envelope(Self::chat_path(), form)
            .await?
            .into_payload()
    }

    fn url(&self, path: &str) -> Result<String, ApiClientError> {
        self.endpoint(path).ok_or(ApiClientError::InvalidPath)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<ApiEnvelope, ApiClientError> {
        let response = builder
            .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()))
            .send()
            .await
            .map_err(|error| ApiClientError::Transport {
                message: error.to_string(),
            })?;
        decode_envelope(response).await
    }
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> ApiClientError {
    let body = non_empty_string(String::from_utf8_lossy(body).to_string())
        .unwrap_or_else(|| "<empty>".to_string());
    ApiClientError::Http { status, body }
}

async fn decode_envelope(response: reqwest::Response) -> Result<ApiEnvelope, ApiClientError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|error| ApiClientError::Read {
            message: error.to_string(),
        })?;

    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }

    serde_json::from_slice::<ApiEnvelope>(&bytes).map_err(|error| ApiClientError::Decode {
        message: error.to_string(),
    })
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
