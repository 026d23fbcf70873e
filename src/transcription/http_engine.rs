//! Engine backed by an OpenAI-compatible `/v1/audio/transcriptions` server
//! (faster-whisper-server, whisper.cpp server, LocalAI, ...).

use super::audio::AudioSource;
use super::engine::{EngineLoader, EngineOutput, TranscriptionEngine};
use super::types::{TranscriptionSegment, WhisperModelSize};
use crate::error::truncate;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const TRANSCRIPTIONS_PATH: &str = "/v1/audio/transcriptions";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HttpWhisperLoader {
    base_url: String,
    timeout: Duration,
    model_name: Option<String>,
    api_key: Option<String>,
}

impl HttpWhisperLoader {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid transcription server address '{}': {}", base_url, e),
                ErrorContext::new().with_field_path("transcription.base_url"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("unsupported scheme '{}'", parsed.scheme()),
                ErrorContext::new().with_field_path("transcription.base_url"),
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            model_name: None,
            api_key: std::env::var("AI_SERVICES_API_KEY").ok().filter(|k| !k.is_empty()),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Server-side model id; defaults to the size name (`base`, `large-v3`, ...).
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }
}

#[async_trait]
impl EngineLoader for HttpWhisperLoader {
    async fn load(&self, model: WhisperModelSize) -> Result<Box<dyn TranscriptionEngine>> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::engine(format!("failed to create HTTP client: {}", e)))?;
        Ok(Box::new(HttpWhisperEngine {
            client,
            endpoint: format!("{}{}", self.base_url, TRANSCRIPTIONS_PATH),
            model: self
                .model_name
                .clone()
                .unwrap_or_else(|| model.as_str().to_string()),
            api_key: self.api_key.clone(),
        }))
    }
}

pub struct HttpWhisperEngine {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    language_probability: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<TranscriptionSegment>,
}

impl From<VerboseTranscription> for EngineOutput {
    fn from(v: VerboseTranscription) -> Self {
        let segments = if v.segments.is_empty() && !v.text.trim().is_empty() {
            vec![TranscriptionSegment {
                start: 0.0,
                end: v.duration.unwrap_or(0.0),
                text: v.text,
            }]
        } else {
            v.segments
        };
        EngineOutput {
            segments,
            language: v.language,
            language_probability: v.language_probability,
            duration: v.duration,
        }
    }
}

#[async_trait]
impl TranscriptionEngine for HttpWhisperEngine {
    async fn transcribe(&self, audio: &AudioSource) -> Result<EngineOutput> {
        let data = audio.read().await?;
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(audio.file_name())
            .mime_str("audio/wav")
            .map_err(|e| Error::engine(format!("invalid mime: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let mut req = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await.map_err(|e| {
            Error::engine_with_context(
                format!("transcription request failed: {}", e),
                ErrorContext::new().with_details(self.endpoint.clone()),
            )
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::engine(format!("failed to read transcription response: {}", e))
        })?;
        if !status.is_success() {
            return Err(Error::engine_with_context(
                format!("transcription server returned HTTP {}", status.as_u16()),
                ErrorContext::new().with_details(truncate(&body, 200)),
            ));
        }
        let decoded: VerboseTranscription = serde_json::from_str(&body).map_err(|e| {
            Error::engine_with_context(
                format!("undecodable transcription response: {}", e),
                ErrorContext::new().with_details(truncate(&body, 200)),
            )
        })?;
        Ok(decoded.into())
    }
}
