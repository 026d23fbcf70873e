//! Engine seam for speech recognition backends.

use super::audio::AudioSource;
use super::types::{TranscriptionSegment, WhisperModelSize};
use crate::Result;
use async_trait::async_trait;

/// Raw engine output before aggregation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineOutput {
    pub segments: Vec<TranscriptionSegment>,
    pub language: Option<String>,
    pub language_probability: Option<f64>,
    pub duration: Option<f64>,
}

/// A loaded recognizer. Calls are serialized by the owning client.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    async fn transcribe(&self, audio: &AudioSource) -> Result<EngineOutput>;
}

/// Produces an engine for a model size. Invoked at most once per successful load.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self, model: WhisperModelSize) -> Result<Box<dyn TranscriptionEngine>>;
}
