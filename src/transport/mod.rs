//! Transport seam between the clients and the network.
//!
//! Clients depend on the [`Transport`] trait only, so tests can hand in a fake
//! instead of patching HTTP internals. [`HttpTransport`] is the `reqwest`
//! implementation used in production.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Raw response as seen by the transport: status plus the full body.
///
/// Bodies are read completely before the response is handed back; a timeout
/// while reading discards whatever was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`TransportError::Status`].
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET {base}{path}` bounded by `timeout`.
    async fn get(&self, path: &str, timeout: Duration) -> Result<TransportResponse, TransportError>;

    /// `POST {base}{path}` with a JSON body, bounded by `timeout`.
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("no response within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("HTTP status {status}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Other(String),
}
