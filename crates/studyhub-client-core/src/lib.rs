//! Shared client core for the Studyhub backend.
//!
//! Everything the synchronizers need to talk to the REST API lives here:
//! base-URL configuration, the uniform `{status, msg, data}` response
//! envelope, the HTTP adapter, the data model, and the chat request builder.

pub mod chat;
pub mod client;
pub mod config;
pub mod envelope;
pub mod model;

pub use chat::{ChatAttachment, ChatRequest, ChatRequestError};
pub use client::{ApiClient, ApiClientConfig, ApiClientError};
pub use config::{
    ConfigError, DEFAULT_API_BASE_URL, ENV_API_BASE_URL, ENV_API_BASE_URL_LEGACY,
    normalize_base_url, resolve_api_base_url,
};
pub use envelope::{ApiEnvelope, ApiStatus};
