//! Response envelope shared by every backend endpoint.
//!
//! Every body has the shape `{ data, success, message, error }`. List
//! endpoints additionally carry a `pagination` block, which comes in two
//! shapes: `{ page, limit, total, totalPages }` or just `{ pages }`. Both are
//! accepted by [`Pagination`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

fn default_success() -> bool {
    true
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            success: true,
            message: None,
            error: None,
            pagination: None,
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Readable text for the user, preferring `error` over `message`.
    pub fn server_message(&self) -> Option<String> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }

    /// Unwrap the payload of a successful envelope.
    ///
    /// A `success: false` envelope delivered with a 2xx status is reported as
    /// [`ApiError::Unknown`] carrying the server message. A missing `data`
    /// field is a decode failure.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            let message = self
                .server_message()
                .unwrap_or_else(|| "The server rejected the request".to_string());
            return Err(ApiError::unknown(message));
        }
        self.data
            .ok_or_else(|| ApiError::decode_failure("Response contained no data"))
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    pub fn decode(bytes: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(bytes).map_err(|e| ApiError::decode_failure(e.to_string()))
    }
}

/// Pull a human-readable message out of an error body, if there is one.
///
/// Never fails: a body that is not an envelope simply yields `None`.
pub fn error_message_from_body(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice::<Envelope<serde_json::Value>>(bytes)
        .ok()
        .and_then(|env| env.server_message())
}

/// Pagination block of list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

impl Pagination {
    /// Total page count from whichever shape the server used.
    pub fn page_count(&self) -> Option<u32> {
        self.total_pages.or(self.pages)
    }
}

/// One decoded page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    pub fn from_envelope(envelope: Envelope<Vec<T>>) -> Result<Self, ApiError> {
        let pagination = envelope.pagination.clone();
        let items = envelope.into_data()?;
        Ok(Self { items, pagination })
    }
}
