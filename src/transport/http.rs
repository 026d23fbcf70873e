use super::{Transport, TransportError, TransportResponse};
use async_trait::async_trait;
use reqwest::Proxy;
use std::env;
use std::time::Duration;
use url::Url;

/// `reqwest`-backed [`Transport`] bound to one base address.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> crate::Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| {
            crate::Error::configuration_with_context(
                format!("invalid base address '{}': {}", base_url, e),
                crate::ErrorContext::new().with_field_path("endpoint.base_url"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(crate::Error::configuration_with_context(
                format!("unsupported scheme '{}'", parsed.scheme()),
                crate::ErrorContext::new().with_field_path("endpoint.base_url"),
            ));
        }

        // Timeouts are applied per request; the client only carries pool settings.
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(
                env::var("AI_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(8),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("AI_HTTP_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )));

        if let Ok(proxy_url) = env::var("AI_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder.build().map_err(|e| {
            crate::Error::configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: env::var("AI_SERVICES_API_KEY").ok().filter(|k| !k.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send(
        &self,
        mut request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, timeout: Duration) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        self.send(self.client.get(&url), timeout).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        self.send(self.client.post(&url).json(body), timeout).await
    }
}

fn map_reqwest_error(e: reqwest::Error, timeout: Duration) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout { timeout }
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(HttpTransport::new("not a url").is_err());
        assert!(HttpTransport::new("ftp://localhost:11434").is_err());
    }

    #[test]
    fn test_url_joining() {
        let t = HttpTransport::new("http://localhost:11434/").unwrap();
        assert_eq!(t.base_url(), "http://localhost:11434");
        assert_eq!(t.url("/api/tags"), "http://localhost:11434/api/tags");
        assert_eq!(t.url("api/tags"), "http://localhost:11434/api/tags");
    }
}
