//! Service endpoint description.

use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "phi3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a remote service lives and how to talk to it by default.
///
/// Immutable once handed to a client; the client owns its copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    base_url: String,
    timeout: Duration,
    model: String,
}

impl ServiceEndpoint {
    pub fn new(base_url: impl Into<String>, timeout: Duration, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            model: model.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Default for ServiceEndpoint {
    /// A local Ollama server with the `phi3` model and a 30 s timeout.
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_URL, DEFAULT_TIMEOUT, DEFAULT_MODEL)
    }
}

/// Prefix `http://` when `addr` has no scheme; `OLLAMA_HOST` is commonly `host:port`.
pub(crate) fn with_scheme(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}
