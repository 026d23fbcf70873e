use super::audio::AudioSource;
use super::engine::{EngineLoader, EngineOutput, TranscriptionEngine};
use super::http_engine::HttpWhisperLoader;
use super::types::{TranscriptionResult, WhisperModelSize};
use crate::{Error, ErrorContext, ErrorKind, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// Speech-to-text client over a lazily loaded engine.
///
/// The engine is loaded on first use. Concurrent first callers share one
/// load; a failed load is not cached, so the next call tries again. Calls
/// into a loaded engine run one at a time.
pub struct TranscriptionClient {
    model_size: WhisperModelSize,
    loader: Arc<dyn EngineLoader>,
    engine: OnceCell<Mutex<Box<dyn TranscriptionEngine>>>,
}

impl std::fmt::Debug for TranscriptionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptionClient")
            .field("model_size", &self.model_size)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl TranscriptionClient {
    pub fn new(model_size: WhisperModelSize, loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            model_size,
            loader,
            engine: OnceCell::new(),
        }
    }

    /// Client backed by an OpenAI-compatible transcription server at `base_url`.
    pub fn http(base_url: &str, model_size: WhisperModelSize, timeout: Duration) -> Result<Self> {
        let loader = HttpWhisperLoader::new(base_url)?.with_timeout(timeout);
        Ok(Self::new(model_size, Arc::new(loader)))
    }

    pub fn model_size(&self) -> WhisperModelSize {
        self.model_size
    }

    pub fn available_models(&self) -> &'static [WhisperModelSize] {
        &WhisperModelSize::ALL
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    /// Load the engine now instead of on the first transcription.
    pub async fn load(&self) -> Result<()> {
        self.engine().await.map(|_| ())
    }

    pub async fn transcribe(&self, audio: &AudioSource) -> Result<TranscriptionResult> {
        let started = Instant::now();
        match self.transcribe_inner(audio).await {
            Ok(output) => Ok(aggregate(output, started.elapsed())),
            Err(e) => {
                let e = as_engine_failure(e);
                warn!(
                    model = %self.model_size,
                    audio = %audio.file_name(),
                    error = %e,
                    "transcription failed"
                );
                Err(e)
            }
        }
    }

    async fn transcribe_inner(&self, audio: &AudioSource) -> Result<EngineOutput> {
        let engine = self.engine().await?;
        let guard = engine.lock().await;
        debug!(audio = %audio.file_name(), "transcribing");
        guard.transcribe(audio).await
    }

    async fn engine(&self) -> Result<&Mutex<Box<dyn TranscriptionEngine>>> {
        self.engine
            .get_or_try_init(|| async {
                info!(model = %self.model_size, "loading transcription engine");
                let started = Instant::now();
                let engine = self.loader.load(self.model_size).await?;
                info!(
                    model = %self.model_size,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "transcription engine loaded"
                );
                Ok(Mutex::new(engine))
            })
            .await
    }
}

/// Every failure on this path surfaces as an engine fault.
fn as_engine_failure(err: Error) -> Error {
    let err = if err.kind() == ErrorKind::Engine {
        err
    } else {
        let mut ctx = ErrorContext::new();
        if let Some(details) = err.context().and_then(|c| c.details.clone()) {
            ctx = ctx.with_details(details);
        }
        Error::engine_with_context(err.to_string(), ctx)
    };
    err.with_source("transcription")
}

fn aggregate(output: EngineOutput, processing_time: Duration) -> TranscriptionResult {
    let text = output
        .segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.trim_end().to_string();
    let word_count = text.split_whitespace().count();
    let language_confidence = output
        .language_probability
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    let duration_seconds = output
        .duration
        .filter(|d| d.is_finite())
        .unwrap_or(0.0)
        .max(0.0);

    TranscriptionResult {
        text,
        language: output.language.unwrap_or_else(|| "unknown".to_string()),
        language_confidence,
        duration_seconds,
        word_count,
        processing_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::types::TranscriptionSegment;

    fn seg(text: &str) -> TranscriptionSegment {
        TranscriptionSegment {
            start: 0.0,
            end: 1.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_aggregate_joins_trimmed_segments() {
        let out = EngineOutput {
            segments: vec![seg("  Hello there. "), seg(" How are   you?  ")],
            language: Some("en".into()),
            language_probability: Some(0.97),
            duration: Some(2.5),
        };
        let r = aggregate(out, Duration::from_millis(10));
        assert_eq!(r.text, "Hello there. How are   you?");
        assert_eq!(r.word_count, 5);
        assert_eq!(r.language, "en");
        assert_eq!(r.duration_seconds, 2.5);
    }

    #[test]
    fn test_aggregate_silent_input() {
        let r = aggregate(EngineOutput::default(), Duration::ZERO);
        assert_eq!(r.text, "");
        assert_eq!(r.word_count, 0);
        assert_eq!(r.language_confidence, 0.0);
        assert_eq!(r.duration_seconds, 0.0);
    }

    #[test]
    fn test_aggregate_clamps_ranges() {
        let out = EngineOutput {
            segments: vec![seg("hi")],
            language: None,
            language_probability: Some(1.7),
            duration: Some(-3.0),
        };
        let r = aggregate(out, Duration::ZERO);
        assert_eq!(r.language_confidence, 1.0);
        assert_eq!(r.duration_seconds, 0.0);
        assert_eq!(r.language, "unknown");
    }

    #[test]
    fn test_non_engine_errors_are_rewrapped() {
        let e = as_engine_failure(Error::parse_with_context("bad body", ErrorContext::new()));
        assert_eq!(e.kind(), ErrorKind::Engine);
        assert_eq!(
            e.context().and_then(|c| c.source.as_deref()),
            Some("transcription")
        );
    }
}
