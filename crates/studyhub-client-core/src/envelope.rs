//! The uniform response envelope all backend replies use.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    Error,
}

impl ApiStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// `{ status: "success"|"error", msg: string, data: object }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub status: ApiStatus,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiEnvelope {
    /// Reject backend-reported errors before anyone looks at `data`.
    ///
    /// Payload shape is undefined on error envelopes, so the error variant
    /// carries only the human-readable message.
    pub fn ensure_success(self) -> Result<Self, ApiClientError> {
        match self.status {
            ApiStatus::Success => Ok(self),
            ApiStatus::Error => Err(ApiClientError::Backend { msg: self.msg }),
        }
    }

    /// Decode the `data` payload of a success envelope.
    pub fn into_payload<T>(self) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let envelope = self.ensure_success()?;
        let data = envelope.data.unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|error| ApiClientError::Decode {
            message: error.to_string(),
        })
    }
}
