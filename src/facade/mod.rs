//! Voice-assistant pipeline over both clients.
//!
//! audio → transcription → (empty ⇒ canned reply) → prompt → text generation.

pub mod prelude;

use crate::client::{GenerationClient, GenerationOptions};
use crate::resilience::{HealthStatus, ReadinessGate};
use crate::transcription::{AudioFormat, AudioSource, TranscriptionClient};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";
/// Returned without calling the model when nothing was heard.
pub const NO_SPEECH_REPLY: &str = "I didn't catch that. Could you please repeat?";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub system_prompt: String,
    pub options: GenerationOptions,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            options: GenerationOptions::default(),
        }
    }
}

impl AssistantConfig {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// `"{system}\n\nUser: {text}\nAssistant:"`
    pub fn prompt_for(&self, user_text: &str) -> String {
        format!("{}\n\nUser: {}\nAssistant:", self.system_prompt, user_text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub transcription: Option<Duration>,
    /// `None` when the model was not called.
    pub generation: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub text: String,
    /// What was heard (or typed); empty when the audio held no speech.
    pub user_text: String,
    pub processing_time: Duration,
    pub timings: StageTimings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Error,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: OverallStatus,
    pub generation: bool,
    pub transcription: bool,
}

impl ServiceStatus {
    pub fn from_parts(generation: bool, transcription: bool) -> Self {
        let status = match (generation, transcription) {
            (true, true) => OverallStatus::Healthy,
            (false, false) => OverallStatus::Error,
            _ => OverallStatus::Degraded,
        };
        Self {
            status,
            generation,
            transcription,
        }
    }
}

/// One transcription client and one generation client, composed.
#[derive(Debug)]
pub struct ServiceFacade {
    generation: GenerationClient,
    transcription: TranscriptionClient,
    assistant: AssistantConfig,
}

impl ServiceFacade {
    pub fn new(generation: GenerationClient, transcription: TranscriptionClient) -> Self {
        Self {
            generation,
            transcription,
            assistant: AssistantConfig::default(),
        }
    }

    pub fn with_assistant(mut self, assistant: AssistantConfig) -> Self {
        self.assistant = assistant;
        self
    }

    /// Build both clients from configuration.
    pub fn from_config(cfg: &crate::config::ServicesConfig) -> Result<Self> {
        Ok(Self::new(cfg.generation_client()?, cfg.transcription_client()?)
            .with_assistant(cfg.assistant_config()))
    }

    pub fn generation(&self) -> &GenerationClient {
        &self.generation
    }

    pub fn transcription(&self) -> &TranscriptionClient {
        &self.transcription
    }

    pub fn assistant(&self) -> &AssistantConfig {
        &self.assistant
    }

    /// Block until the generation server answers, within `gate`'s budget.
    pub async fn wait_until_ready(&self, gate: &ReadinessGate) -> HealthStatus {
        gate.wait(&self.generation).await
    }

    /// Transcribe `audio`, then answer it.
    pub async fn respond_to_audio(&self, audio: &AudioSource) -> Result<AssistantReply> {
        let started = Instant::now();

        let t0 = Instant::now();
        let heard = self.transcription.transcribe(audio).await?;
        let transcription_time = t0.elapsed();
        info!(
            words = heard.word_count,
            elapsed_ms = transcription_time.as_millis() as u64,
            "transcription complete"
        );

        if heard.text.trim().is_empty() {
            return Ok(AssistantReply {
                text: NO_SPEECH_REPLY.to_string(),
                user_text: String::new(),
                processing_time: started.elapsed(),
                timings: StageTimings {
                    transcription: Some(transcription_time),
                    generation: None,
                },
            });
        }

        let (text, generation_time) = self.generate(&heard.text).await?;
        Ok(AssistantReply {
            text,
            user_text: heard.text,
            processing_time: started.elapsed(),
            timings: StageTimings {
                transcription: Some(transcription_time),
                generation: Some(generation_time),
            },
        })
    }

    /// Decode a base64 payload (raw PCM gets a WAV header) and answer it.
    pub async fn respond_to_base64(
        &self,
        audio: &str,
        format: Option<AudioFormat>,
    ) -> Result<AssistantReply> {
        let source = AudioSource::from_base64(audio, format)?;
        self.respond_to_audio(&source).await
    }

    /// Answer typed input with the same prompt framing.
    pub async fn respond_to_text(&self, user_text: &str) -> Result<AssistantReply> {
        let started = Instant::now();
        let (text, generation_time) = self.generate(user_text).await?;
        Ok(AssistantReply {
            text,
            user_text: user_text.to_string(),
            processing_time: started.elapsed(),
            timings: StageTimings {
                transcription: None,
                generation: Some(generation_time),
            },
        })
    }

    /// Probe the generation server and make sure the engine can be loaded.
    pub async fn status(&self) -> ServiceStatus {
        let (generation, transcription) = futures::join!(
            self.generation.health_check(),
            self.transcription.load()
        );
        ServiceStatus::from_parts(generation, transcription.is_ok())
    }

    async fn generate(&self, user_text: &str) -> Result<(String, Duration)> {
        let t0 = Instant::now();
        let prompt = self.assistant.prompt_for(user_text);
        let text = self
            .generation
            .generate_text(&prompt, &self.assistant.options)
            .await?;
        let elapsed = t0.elapsed();
        info!(elapsed_ms = elapsed.as_millis() as u64, "generation complete");
        Ok((text, elapsed))
    }
}
