use crate::client::endpoint::{with_scheme, ServiceEndpoint, DEFAULT_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_TIMEOUT};
use crate::client::generation::GenerationClient;
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`GenerationClient`].
///
/// Unset values fall back to env (`OLLAMA_HOST`, `OLLAMA_MODEL`,
/// `AI_SERVICES_TIMEOUT_SECS`) and then to a local `phi3` server.
#[derive(Default)]
pub struct GenerationClientBuilder {
    base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl GenerationClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing endpoint.
    pub fn endpoint(mut self, endpoint: &ServiceEndpoint) -> Self {
        self.base_url = Some(endpoint.base_url().to_string());
        self.model = Some(endpoint.model().to_string());
        self.timeout = Some(endpoint.timeout());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Swap the HTTP stack for another [`Transport`] (e.g. a test double).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<GenerationClient> {
        let base_url = self
            .base_url
            .or_else(|| {
                std::env::var("OLLAMA_HOST")
                    .ok()
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .map(|h| with_scheme(&h))
            })
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        let model = self
            .model
            .or_else(|| std::env::var("OLLAMA_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout = self
            .timeout
            .or_else(|| {
                std::env::var("AI_SERVICES_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs)
            })
            .unwrap_or(DEFAULT_TIMEOUT);

        let endpoint = ServiceEndpoint::new(base_url, timeout, model);
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(endpoint.base_url())?),
        };
        Ok(GenerationClient::with_transport(endpoint, transport))
    }
}
