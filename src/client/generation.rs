use crate::client::builder::GenerationClientBuilder;
use crate::client::endpoint::ServiceEndpoint;
use crate::client::types::{
    FunctionCallRequest, GenerationOptions, ModelDescriptor, StructuredGenerationRequest,
    StructuredGenerationResult, TagsResponse,
};
use crate::error::truncate;
use crate::resilience::HealthProbe;
use crate::structured::{parse_json_content, OutputValidator};
use crate::transport::{HttpTransport, Transport, TransportResponse};
use crate::types::message::{ChatResponse, GenerateResponse, WireToolCall};
use crate::types::{ChatMessage, FunctionCallResult, ToolInvocation};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const CHAT_PATH: &str = "/api/chat";
const GENERATE_PATH: &str = "/api/generate";
const VERSION_PATH: &str = "/api/version";
const TAGS_PATH: &str = "/api/tags";

/// Health probes use their own short timeout, independent of the endpoint's.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for an Ollama-compatible language-model server.
///
/// Every call is a single non-streaming request/response exchange. A failed
/// call is logged once at `warn` and returned as a typed [`Error`]; nothing is
/// retried here (see [`crate::resilience::RetryPolicy`] for caller-side retry).
///
/// The client holds no mutable state and can be shared across tasks.
#[derive(Clone)]
pub struct GenerationClient {
    endpoint: ServiceEndpoint,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GenerationClient {
    /// HTTP client for `endpoint`.
    pub fn new(endpoint: ServiceEndpoint) -> Result<Self> {
        let transport = HttpTransport::new(endpoint.base_url())?;
        Ok(Self::with_transport(endpoint, Arc::new(transport)))
    }

    pub fn with_transport(endpoint: ServiceEndpoint, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint,
            transport,
        }
    }

    pub fn builder() -> GenerationClientBuilder {
        GenerationClientBuilder::new()
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Free-form completion via `/api/generate`.
    pub async fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        self.observe("generate_text", async {
            options.validate()?;
            let body = json!({
                "model": self.model_for(options),
                "prompt": prompt,
                "stream": false,
                "options": options.to_wire(),
            });
            let resp = self.post(GENERATE_PATH, &body).await?;
            let decoded: GenerateResponse = decode(&resp, "generate response")?;
            Ok(decoded.response)
        })
        .await
    }

    /// Ask for a JSON object conforming to `request.response_schema`.
    ///
    /// The schema is sent as the server-side `format` constraint and the reply
    /// is checked again locally. Content wrapped in a single Markdown code fence
    /// is unwrapped; any other non-JSON content is a parse failure. Keys outside
    /// the schema are preserved.
    pub async fn generate_structured(
        &self,
        request: &StructuredGenerationRequest,
    ) -> Result<StructuredGenerationResult> {
        self.observe("generate_structured", async {
            if !request.response_schema.is_object() {
                return Err(Error::invalid_request_with_context(
                    "response schema root must be an object",
                    ErrorContext::new().with_field_path("response_schema"),
                ));
            }
            request.options.validate()?;

            let body = json!({
                "model": self.model_for(&request.options),
                "messages": [ChatMessage::user(&request.prompt)],
                "format": request.response_schema.to_json(),
                "stream": false,
                "options": request.options.to_wire(),
            });
            let resp = self.post(CHAT_PATH, &body).await?;
            let decoded: ChatResponse = decode(&resp, "chat response")?;

            let value = parse_json_content(&decoded.message.content)?;
            let validation = OutputValidator::lenient(&request.response_schema).validate(&value);
            if !validation.is_valid() {
                return Err(Error::schema_validation(validation.errors));
            }
            match value {
                Value::Object(map) => Ok(StructuredGenerationResult::new(map)),
                other => Err(Error::parse_with_context(
                    "model output is not a JSON object",
                    ErrorContext::new().with_details(truncate(&other.to_string(), 120)),
                )),
            }
        })
        .await
    }

    /// Offer tools to the model and return the invocations it proposes, in order.
    ///
    /// Tools are never executed. An empty result means the model answered
    /// without calling anything.
    pub async fn invoke_tools(&self, request: &FunctionCallRequest) -> Result<FunctionCallResult> {
        self.observe("invoke_tools", async {
            request.validate()?;

            let tools: Vec<Value> = request.tools.iter().map(|t| t.to_wire()).collect();
            let body = json!({
                "model": self.model_for(&request.options),
                "messages": [ChatMessage::user(&request.prompt)],
                "tools": tools,
                "stream": false,
                "options": request.options.to_wire(),
            });
            let resp = self.post(CHAT_PATH, &body).await?;
            let decoded: ChatResponse = decode(&resp, "chat response")?;

            decoded
                .message
                .tool_calls
                .into_iter()
                .enumerate()
                .map(|(i, call)| to_invocation(i, call))
                .collect()
        })
        .await
    }

    /// Probe `/api/version`. True only for an HTTP 200 within [`HEALTH_TIMEOUT`].
    ///
    /// Never fails; any transport problem reads as "not healthy".
    pub async fn health_check(&self) -> bool {
        match self.transport.get(VERSION_PATH, HEALTH_TIMEOUT).await {
            Ok(resp) if resp.status == 200 => true,
            Ok(resp) => {
                debug!(status = resp.status, "generation service not healthy");
                false
            }
            Err(e) => {
                debug!(error = %e, "generation service unreachable");
                false
            }
        }
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let models = self.list_model_details().await?;
        Ok(models.into_iter().map(|m| m.name).collect())
    }

    /// Full `/api/tags` descriptors.
    pub async fn list_model_details(&self) -> Result<Vec<ModelDescriptor>> {
        self.observe("list_models", async {
            let resp = self
                .transport
                .get(TAGS_PATH, self.endpoint.timeout())
                .await?
                .error_for_status()?;
            let tags: TagsResponse = decode(&resp, "model list")?;
            Ok(tags.models)
        })
        .await
    }

    fn model_for<'a>(&'a self, options: &'a GenerationOptions) -> &'a str {
        options.model.as_deref().unwrap_or(self.endpoint.model())
    }

    async fn post(&self, path: &str, body: &Value) -> Result<TransportResponse> {
        let resp = self
            .transport
            .post_json(path, body, self.endpoint.timeout())
            .await?
            .error_for_status()?;
        Ok(resp)
    }

    async fn observe<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match call.await {
            Ok(v) => Ok(v),
            Err(e) => {
                let e = e.with_source("generation");
                warn!(
                    operation,
                    kind = ?e.kind(),
                    base_url = self.endpoint.base_url(),
                    error = %e,
                    "generation call failed"
                );
                Err(e)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(resp: &TransportResponse, what: &str) -> Result<T> {
    resp.json().map_err(|e| {
        Error::parse_with_context(
            format!("unexpected {} envelope: {}", what, e),
            ErrorContext::new().with_details(truncate(&resp.body, 200)),
        )
    })
}

fn to_invocation(index: usize, call: WireToolCall) -> Result<ToolInvocation> {
    let field = || format!("message.tool_calls[{}].function.arguments", index);
    let arguments = match call.function.arguments {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => {
                return Err(Error::parse_with_context(
                    format!("arguments for '{}' are not a JSON object", call.function.name),
                    ErrorContext::new()
                        .with_field_path(field())
                        .with_details(truncate(&raw, 120)),
                ))
            }
        },
        other => {
            return Err(Error::parse_with_context(
                format!("arguments for '{}' are not a JSON object", call.function.name),
                ErrorContext::new()
                    .with_field_path(field())
                    .with_details(truncate(&other.to_string(), 120)),
            ))
        }
    };
    Ok(ToolInvocation {
        tool_name: call.function.name,
        arguments,
    })
}

#[async_trait]
impl HealthProbe for GenerationClient {
    async fn probe(&self) -> bool {
        self.health_check().await
    }
}
