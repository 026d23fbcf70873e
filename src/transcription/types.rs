//! Transcription types.

use crate::{Error, ErrorContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Outcome of one transcription call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Segment texts joined by single spaces; empty for silent input.
    pub text: String,
    pub language: String,
    /// Always within `[0, 1]`.
    pub language_confidence: f64,
    /// Never negative.
    pub duration_seconds: f64,
    pub word_count: usize,
    /// Wall time of the call, including a first-use engine load.
    pub processing_time: Duration,
}

impl TranscriptionResult {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A piece of recognized speech with timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    pub text: String,
}

/// Whisper checkpoint sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WhisperModelSize {
    #[serde(rename = "tiny")]
    Tiny,
    #[default]
    #[serde(rename = "base")]
    Base,
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "large")]
    Large,
    #[serde(rename = "large-v2")]
    LargeV2,
    #[serde(rename = "large-v3")]
    LargeV3,
}

impl WhisperModelSize {
    pub const ALL: [WhisperModelSize; 7] = [
        WhisperModelSize::Tiny,
        WhisperModelSize::Base,
        WhisperModelSize::Small,
        WhisperModelSize::Medium,
        WhisperModelSize::Large,
        WhisperModelSize::LargeV2,
        WhisperModelSize::LargeV3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WhisperModelSize::Tiny => "tiny",
            WhisperModelSize::Base => "base",
            WhisperModelSize::Small => "small",
            WhisperModelSize::Medium => "medium",
            WhisperModelSize::Large => "large",
            WhisperModelSize::LargeV2 => "large-v2",
            WhisperModelSize::LargeV3 => "large-v3",
        }
    }
}

impl fmt::Display for WhisperModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WhisperModelSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == needle)
            .ok_or_else(|| {
                Error::configuration_with_context(
                    format!("unknown whisper model size '{}'", s),
                    ErrorContext::new()
                        .with_field_path("transcription.model_size")
                        .with_details(
                            Self::ALL
                                .iter()
                                .map(|m| m.as_str())
                                .collect::<Vec<_>>()
                                .join(", "),
                        ),
                )
            })
    }
}
