//! Hand-written test doubles for the transport and engine seams.

use ai_services_client::transcription::{
    AudioSource, EngineLoader, EngineOutput, TranscriptionEngine, TranscriptionSegment,
    WhisperModelSize,
};
use ai_services_client::transport::{Transport, TransportError, TransportResponse};
use ai_services_client::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Reply = std::result::Result<TransportResponse, TransportError>;

/// Scripted [`Transport`]: pops one reply per call and records what was sent.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    bodies: Mutex<Vec<(String, Value)>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_replies(replies: Vec<Reply>) -> Arc<Self> {
        let t = Self::default();
        *t.replies.lock().unwrap() = replies.into();
        Arc::new(t)
    }

    pub fn ok(status: u16, body: &str) -> Reply {
        Ok(TransportResponse::new(status, body))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// (path, body) of every POST, in order.
    pub fn posted(&self) -> Vec<(String, Value)> {
        self.bodies.lock().unwrap().clone()
    }

    fn next(&self) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("no scripted reply".into())))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, _path: &str, _timeout: Duration) -> Reply {
        self.next()
    }

    async fn post_json(&self, path: &str, body: &Value, _timeout: Duration) -> Reply {
        self.bodies
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));
        self.next()
    }
}

/// Engine returning a fixed output, or failing every call.
pub struct FakeEngine {
    pub output: EngineOutput,
    pub fail_with: Option<String>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TranscriptionEngine for FakeEngine {
    async fn transcribe(&self, _audio: &AudioSource) -> Result<EngineOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(cause) => Err(Error::engine(cause.clone())),
            None => Ok(self.output.clone()),
        }
    }
}

/// Loader counting loads; the first `fail_first` loads fail.
pub struct FakeLoader {
    pub output: EngineOutput,
    pub engine_fails: Option<String>,
    pub fail_first: usize,
    pub delay: Duration,
    pub loads: Arc<AtomicUsize>,
    pub engine_calls: Arc<AtomicUsize>,
}

impl FakeLoader {
    pub fn speaking(segments: &[&str]) -> Self {
        Self {
            output: EngineOutput {
                segments: segments
                    .iter()
                    .map(|t| TranscriptionSegment {
                        start: 0.0,
                        end: 1.0,
                        text: t.to_string(),
                    })
                    .collect(),
                language: Some("en".into()),
                language_probability: Some(0.93),
                duration: Some(segments.len() as f64),
            },
            engine_fails: None,
            fail_first: 0,
            delay: Duration::ZERO,
            loads: Arc::new(AtomicUsize::new(0)),
            engine_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn silent() -> Self {
        let mut l = Self::speaking(&[]);
        l.output.duration = Some(1.0);
        l
    }
}

#[async_trait]
impl EngineLoader for FakeLoader {
    async fn load(&self, _model: WhisperModelSize) -> Result<Box<dyn TranscriptionEngine>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let n = self.loads.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            return Err(Error::engine("model weights missing"));
        }
        Ok(Box::new(FakeEngine {
            output: self.output.clone(),
            fail_with: self.engine_fails.clone(),
            calls: self.engine_calls.clone(),
        }))
    }
}

pub fn wav_source() -> AudioSource {
    let mut data = ai_services_client::transcription::wav_header(
        3200,
        &ai_services_client::transcription::AudioFormat::new(16000, 1, 16),
    )
    .to_vec();
    data.extend(std::iter::repeat(0u8).take(3200));
    AudioSource::from_bytes(data, "clip.wav")
}
