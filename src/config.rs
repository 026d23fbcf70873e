//! Service configuration: YAML file plus environment overrides.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults (local Ollama on :11434 with `phi3`, transcription
//!    server on :8000 with the `base` model, 30 readiness probes 2 s apart)
//! 2. The YAML file named by `AI_SERVICES_CONFIG`, if set
//! 3. `OLLAMA_HOST`, `OLLAMA_MODEL`, `AI_SERVICES_TIMEOUT_SECS`, `WHISPER_URL`,
//!    `WHISPER_MODEL`, `AI_SERVICES_READY_ATTEMPTS`, `AI_SERVICES_READY_INTERVAL_MS`
//!
//! ```yaml
//! generation:
//!   base_url: http://gpu-box:11434
//!   model: phi4
//!   timeout_secs: 60
//! transcription:
//!   base_url: http://gpu-box:8000
//!   model_size: large-v3
//! readiness:
//!   max_attempts: 10
//!   interval_ms: 500
//! assistant:
//!   system_prompt: You are a terse assistant.
//! ```

use crate::client::endpoint::{with_scheme, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use crate::client::{GenerationClient, GenerationOptions, ServiceEndpoint};
use crate::facade::AssistantConfig;
use crate::resilience::ReadinessGate;
use crate::transcription::{TranscriptionClient, WhisperModelSize};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const CONFIG_PATH_ENV: &str = "AI_SERVICES_CONFIG";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServicesConfig {
    pub generation: GenerationSettings,
    pub transcription: TranscriptionSettings,
    pub readiness: ReadinessSettings,
    pub assistant: AssistantSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranscriptionSettings {
    pub base_url: String,
    pub model_size: WhisperModelSize,
    pub timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            model_size: WhisperModelSize::Base,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessSettings {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        let gate = ReadinessGate::default();
        Self {
            max_attempts: gate.max_attempts,
            interval_ms: gate.interval.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssistantSettings {
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        let cfg = AssistantConfig::default();
        Self {
            system_prompt: cfg.system_prompt,
            temperature: cfg.options.temperature,
            max_tokens: cfg.options.max_tokens,
        }
    }
}

impl ServicesConfig {
    /// Defaults, then the file at `AI_SERVICES_CONFIG` (if set), then env overrides.
    pub async fn load() -> Result<Self> {
        let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(path.trim()).await?,
            _ => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::configuration_with_context(
                format!("failed to read config file: {}", e),
                ErrorContext::new().with_details(path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid config file: {}", e),
                ErrorContext::new().with_source("config"),
            )
        })
    }

    /// Overlay values from `lookup` (normally the process environment).
    ///
    /// Unparseable numbers are ignored; an unknown model size is an error.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = get("OLLAMA_HOST") {
            self.generation.base_url = with_scheme(&host);
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            self.generation.model = model;
        }
        if let Some(secs) = get("AI_SERVICES_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.generation.timeout_secs = secs;
        }
        if let Some(url) = get("WHISPER_URL") {
            self.transcription.base_url = with_scheme(&url);
        }
        if let Some(size) = get("WHISPER_MODEL") {
            self.transcription.model_size = size.parse()?;
        }
        if let Some(n) = get("AI_SERVICES_READY_ATTEMPTS").and_then(|s| s.parse().ok()) {
            self.readiness.max_attempts = n;
        }
        if let Some(ms) = get("AI_SERVICES_READY_INTERVAL_MS").and_then(|s| s.parse().ok()) {
            self.readiness.interval_ms = ms;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_url(&self.generation.base_url, "generation.base_url")?;
        check_url(&self.transcription.base_url, "transcription.base_url")?;
        if self.generation.model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model must not be empty",
                ErrorContext::new().with_field_path("generation.model"),
            ));
        }
        for (value, field) in [
            (self.generation.timeout_secs, "generation.timeout_secs"),
            (self.transcription.timeout_secs, "transcription.timeout_secs"),
        ] {
            if value == 0 {
                return Err(Error::configuration_with_context(
                    "timeout must be greater than 0",
                    ErrorContext::new().with_field_path(field),
                ));
            }
        }
        self.assistant_config().options.validate().map_err(|e| {
            Error::configuration_with_context(
                e.to_string(),
                ErrorContext::new().with_field_path("assistant"),
            )
        })
    }

    pub fn generation_endpoint(&self) -> ServiceEndpoint {
        ServiceEndpoint::new(
            self.generation.base_url.clone(),
            Duration::from_secs(self.generation.timeout_secs),
            self.generation.model.clone(),
        )
    }

    pub fn readiness_gate(&self) -> ReadinessGate {
        ReadinessGate::new(
            self.readiness.max_attempts,
            Duration::from_millis(self.readiness.interval_ms),
        )
    }

    pub fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig {
            system_prompt: self.assistant.system_prompt.clone(),
            options: GenerationOptions::default()
                .temperature(self.assistant.temperature)
                .max_tokens(self.assistant.max_tokens),
        }
    }

    pub fn generation_client(&self) -> Result<GenerationClient> {
        GenerationClient::new(self.generation_endpoint())
    }

    pub fn transcription_client(&self) -> Result<TranscriptionClient> {
        TranscriptionClient::http(
            &self.transcription.base_url,
            self.transcription.model_size,
            Duration::from_secs(self.transcription.timeout_secs),
        )
    }
}

fn check_url(value: &str, field: &str) -> Result<()> {
    match Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        Ok(u) => Err(Error::configuration_with_context(
            format!("unsupported scheme '{}'", u.scheme()),
            ErrorContext::new().with_field_path(field),
        )),
        Err(e) => Err(Error::configuration_with_context(
            format!("invalid URL '{}': {}", value, e),
            ErrorContext::new().with_field_path(field),
        )),
    }
}
