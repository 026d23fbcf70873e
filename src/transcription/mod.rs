//! Speech-to-text over a lazily loaded Whisper-family engine.
//!
//! [`TranscriptionClient`] owns the engine handle; engines plug in through
//! [`EngineLoader`] / [`TranscriptionEngine`]. [`HttpWhisperLoader`] talks to
//! an OpenAI-compatible transcription server.

mod audio;
mod client;
mod engine;
mod http_engine;
mod types;

pub use audio::{is_wav, wav_header, AudioFormat, AudioSource, WavInfo};
pub use client::TranscriptionClient;
pub use engine::{EngineLoader, EngineOutput, TranscriptionEngine};
pub use http_engine::{HttpWhisperEngine, HttpWhisperLoader};
pub use types::{TranscriptionResult, TranscriptionSegment, WhisperModelSize};
