//! Request and result types for the generation client.

use crate::structured::ResponseSchema;
use crate::types::ToolSpec;
use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Sampling options for a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Overrides the endpoint's default model.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl GenerationOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    /// temperature ∈ [0, 2], max_tokens > 0.
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::invalid_request_with_context(
                format!("temperature must be within [0, 2], got {}", self.temperature),
                ErrorContext::new().with_field_path("options.temperature"),
            ));
        }
        if self.max_tokens == 0 {
            return Err(Error::invalid_request_with_context(
                "max_tokens must be greater than 0",
                ErrorContext::new().with_field_path("options.max_tokens"),
            ));
        }
        if matches!(&self.model, Some(m) if m.trim().is_empty()) {
            return Err(Error::invalid_request_with_context(
                "model must not be empty",
                ErrorContext::new().with_field_path("options.model"),
            ));
        }
        Ok(())
    }

    /// Server-side sampling block (`num_predict` is the token ceiling).
    pub(crate) fn to_wire(&self) -> Value {
        json!({
            "temperature": self.temperature,
            "num_predict": self.max_tokens,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredGenerationRequest {
    pub prompt: String,
    pub response_schema: ResponseSchema,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

impl StructuredGenerationRequest {
    pub fn new(prompt: impl Into<String>, response_schema: ResponseSchema) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Schema-validated object returned by a structured call.
///
/// Every required key of the request schema is present and type-correct;
/// keys the schema does not mention are kept as returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StructuredGenerationResult(Map<String, Value>);

impl StructuredGenerationResult {
    pub(crate) fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Deserialize into a caller type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            Error::parse_with_context(
                format!("structured result does not match target type: {}", e),
                ErrorContext::new().with_source("structured"),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallRequest {
    pub prompt: String,
    pub tools: Vec<ToolSpec>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

impl FunctionCallRequest {
    pub fn new(prompt: impl Into<String>, tools: Vec<ToolSpec>) -> Self {
        Self {
            prompt: prompt.into(),
            tools,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Tool names must be unique within the request.
    pub fn validate(&self) -> Result<()> {
        for (i, tool) in self.tools.iter().enumerate() {
            if tool.name.trim().is_empty() {
                return Err(Error::invalid_request_with_context(
                    "tool name must not be empty",
                    ErrorContext::new().with_field_path(format!("tools[{}].name", i)),
                ));
            }
            if self.tools[..i].iter().any(|t| t.name == tool.name) {
                return Err(Error::invalid_request_with_context(
                    format!("duplicate tool name '{}'", tool.name),
                    ErrorContext::new().with_field_path(format!("tools[{}].name", i)),
                ));
            }
        }
        self.options.validate()
    }
}

/// A model installed on the server, as listed by `/api/tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_options_bounds() {
        assert!(GenerationOptions::default().validate().is_ok());
        assert!(GenerationOptions::default().temperature(2.0).validate().is_ok());
        assert!(GenerationOptions::default().temperature(0.0).validate().is_ok());

        let err = GenerationOptions::default().temperature(2.1).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(GenerationOptions::default().temperature(f32::NAN).validate().is_err());
        assert!(GenerationOptions::default().max_tokens(0).validate().is_err());
        assert!(GenerationOptions::default().model("  ").validate().is_err());
    }

    #[test]
    fn test_duplicate_tool_names_rejected() {
        let tool = |name: &str| ToolSpec::new(name, "", ResponseSchema::Any);
        let req = FunctionCallRequest::new("hi", vec![tool("a"), tool("b"), tool("a")]);
        let err = req.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("tools[2].name")
        );
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: StructuredGenerationRequest = serde_json::from_value(json!({
            "prompt": "What's the weather in Paris?",
            "response_schema": {"type": "object", "properties": {"location": {"type": "string"}}},
            "model": "phi4"
        }))
        .unwrap();
        assert_eq!(req.options.model.as_deref(), Some("phi4"));
        assert_eq!(req.options.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(req.options.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_structured_result_deserialize() {
        #[derive(Deserialize)]
        struct Weather {
            location: String,
            temperature: f64,
        }
        let mut map = Map::new();
        map.insert("location".into(), json!("Paris"));
        map.insert("temperature".into(), json!(22.5));
        let result = StructuredGenerationResult::new(map);
        let w: Weather = result.deserialize().unwrap();
        assert_eq!(w.location, "Paris");
        assert_eq!(w.temperature, 22.5);
    }
}
