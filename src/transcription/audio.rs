//! Audio input handling: sources, base64 payloads and WAV framing.

use crate::error::truncate;
use crate::{Error, ErrorContext, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SUPPORTED_RATES: [u32; 5] = [8000, 16000, 22050, 44100, 48000];
const SUPPORTED_CHANNELS: [u16; 2] = [1, 2];
const SUPPORTED_BITS: [u16; 4] = [8, 16, 24, 32];
const WAV_HEADER_LEN: usize = 44;

/// Audio handed to a transcription engine.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// A file the engine reads itself.
    Path(PathBuf),
    /// In-memory audio (usually WAV).
    Bytes { data: Bytes, file_name: String },
}

impl AudioSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        AudioSource::Path(path.into())
    }

    pub fn from_bytes(data: impl Into<Bytes>, file_name: impl Into<String>) -> Self {
        AudioSource::Bytes {
            data: data.into(),
            file_name: file_name.into(),
        }
    }

    /// Decode a base64 payload.
    ///
    /// A payload that is already RIFF/WAVE is used unchanged. Anything else is
    /// treated as raw PCM and framed with a WAV header built from `format`
    /// (normalized), or the 48 kHz mono 16-bit default.
    pub fn from_base64(encoded: &str, format: Option<AudioFormat>) -> Result<Self> {
        let raw = STANDARD.decode(encoded.trim()).map_err(|e| {
            Error::invalid_request_with_context(
                format!("audio payload is not valid base64: {}", e),
                ErrorContext::new()
                    .with_field_path("audio")
                    .with_details(truncate(encoded, 40)),
            )
        })?;
        if raw.is_empty() {
            return Err(Error::invalid_request_with_context(
                "audio payload is empty",
                ErrorContext::new().with_field_path("audio"),
            ));
        }

        if is_wav(&raw) {
            debug!(bytes = raw.len(), "audio payload already WAV");
            return Ok(Self::from_bytes(raw, "audio.wav"));
        }

        let format = format.map(|f| f.normalized()).unwrap_or_default();
        debug!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            bits_per_sample = format.bits_per_sample,
            "framing raw PCM as WAV"
        );
        Ok(Self::from_bytes(wrap_pcm(&raw, &format)?, "audio.wav"))
    }

    /// File name presented to remote engines.
    pub fn file_name(&self) -> String {
        match self {
            AudioSource::Path(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "audio.wav".to_string()),
            AudioSource::Bytes { file_name, .. } => file_name.clone(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            AudioSource::Path(p) => Some(p),
            AudioSource::Bytes { .. } => None,
        }
    }

    /// Load the audio into memory. Unreadable files are an engine fault.
    pub async fn read(&self) -> Result<Bytes> {
        match self {
            AudioSource::Bytes { data, .. } => Ok(data.clone()),
            AudioSource::Path(p) => tokio::fs::read(p).await.map(Bytes::from).map_err(|e| {
                Error::engine_with_context(
                    format!("cannot read audio file: {}", e),
                    ErrorContext::new().with_details(p.display().to_string()),
                )
            }),
        }
    }
}

/// PCM layout used when framing raw audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Replace each unsupported field with its default, logging a warning.
    pub fn normalized(self) -> Self {
        let d = Self::default();
        let sample_rate = if SUPPORTED_RATES.contains(&self.sample_rate) {
            self.sample_rate
        } else {
            warn!(sample_rate = self.sample_rate, "unsupported sample rate, using {}", d.sample_rate);
            d.sample_rate
        };
        let channels = if SUPPORTED_CHANNELS.contains(&self.channels) {
            self.channels
        } else {
            warn!(channels = self.channels, "unsupported channel count, using {}", d.channels);
            d.channels
        };
        let bits_per_sample = if SUPPORTED_BITS.contains(&self.bits_per_sample) {
            self.bits_per_sample
        } else {
            warn!(
                bits_per_sample = self.bits_per_sample,
                "unsupported bits per sample, using {}", d.bits_per_sample
            );
            d.bits_per_sample
        };
        Self::new(sample_rate, channels, bits_per_sample)
    }

    /// Bytes per frame; `None` when it does not fit the 16-bit header field.
    fn block_align(&self) -> Option<u16> {
        let bytes = u32::from(self.channels) * u32::from(self.bits_per_sample) / 8;
        u16::try_from(bytes).ok()
    }

    fn byte_rate(&self) -> Option<u32> {
        self.sample_rate.checked_mul(u32::from(self.block_align()?))
    }
}

pub fn is_wav(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE"
}

/// 44-byte canonical PCM header for `data_len` bytes of samples.
pub fn wav_header(data_len: u32, format: &AudioFormat) -> Bytes {
    let mut buf = BytesMut::with_capacity(WAV_HEADER_LEN);
    buf.put_slice(b"RIFF");
    buf.put_u32_le(data_len.saturating_add(36));
    buf.put_slice(b"WAVE");
    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(1);
    buf.put_u16_le(format.channels);
    buf.put_u32_le(format.sample_rate);
    // Out-of-range formats saturate; `normalized()` formats never do.
    buf.put_u32_le(format.byte_rate().unwrap_or(u32::MAX));
    buf.put_u16_le(format.block_align().unwrap_or(u16::MAX));
    buf.put_u16_le(format.bits_per_sample);
    buf.put_slice(b"data");
    buf.put_u32_le(data_len);
    buf.freeze()
}

fn wrap_pcm(pcm: &[u8], format: &AudioFormat) -> Result<Bytes> {
    let len = u32::try_from(pcm.len()).map_err(|_| {
        Error::invalid_request_with_context(
            "PCM payload too large for a WAV container",
            ErrorContext::new().with_field_path("audio"),
        )
    })?;
    let mut out = BytesMut::with_capacity(WAV_HEADER_LEN + pcm.len());
    out.put(wav_header(len, format));
    out.put_slice(pcm);
    Ok(out.freeze())
}

/// Summary of a WAV container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub frames: u64,
    pub duration_seconds: f64,
}

impl WavInfo {
    /// Walk the RIFF chunks for `fmt ` and `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !is_wav(data) {
            return Err(wav_error("missing RIFF/WAVE signature"));
        }
        let mut fmt: Option<AudioFormat> = None;
        let mut data_len: Option<u64> = None;
        let mut pos = 12usize;
        while pos + 8 <= data.len() {
            let id = &data[pos..pos + 4];
            let size = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                as usize;
            let body = pos + 8;
            match id {
                b"fmt " => {
                    if size < 16 || body + 16 > data.len() {
                        return Err(wav_error("truncated fmt chunk"));
                    }
                    let c = &data[body..body + 16];
                    fmt = Some(AudioFormat::new(
                        u32::from_le_bytes([c[4], c[5], c[6], c[7]]),
                        u16::from_le_bytes([c[2], c[3]]),
                        u16::from_le_bytes([c[14], c[15]]),
                    ));
                }
                b"data" => {
                    // Streamed WAVs may declare more than is present.
                    let available = data.len().saturating_sub(body);
                    data_len = Some(size.min(available) as u64);
                    break;
                }
                _ => {}
            }
            pos = body.saturating_add(size).saturating_add(size & 1);
        }

        let fmt = fmt.ok_or_else(|| wav_error("no fmt chunk"))?;
        let data_len = data_len.ok_or_else(|| wav_error("no data chunk"))?;
        let block_align = fmt
            .block_align()
            .ok_or_else(|| wav_error("fmt chunk declares an oversized frame"))?;
        if fmt.sample_rate == 0 || block_align == 0 {
            return Err(wav_error("fmt chunk declares zero rate or frame size"));
        }
        let frames = data_len / u64::from(block_align);
        Ok(Self {
            channels: fmt.channels,
            sample_rate: fmt.sample_rate,
            bits_per_sample: fmt.bits_per_sample,
            frames,
            duration_seconds: frames as f64 / f64::from(fmt.sample_rate),
        })
    }
}

fn wav_error(msg: &str) -> Error {
    Error::parse_with_context(
        format!("invalid WAV data: {}", msg),
        ErrorContext::new().with_source("audio"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let h = wav_header(96000, &AudioFormat::default());
        assert_eq!(h.len(), 44);
        assert_eq!(&h[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([h[4], h[5], h[6], h[7]]), 96036);
        assert_eq!(&h[8..16], b"WAVEfmt ");
        // byte rate = 48000 * 1 * 2
        assert_eq!(u32::from_le_bytes([h[28], h[29], h[30], h[31]]), 96000);
        assert_eq!(&h[36..40], b"data");
    }

    #[test]
    fn test_base64_pcm_gets_wrapped() {
        let pcm = vec![0u8; 32000]; // 1 s of 16 kHz mono 16-bit silence
        let encoded = STANDARD.encode(&pcm);
        let src = AudioSource::from_base64(&encoded, Some(AudioFormat::new(16000, 1, 16))).unwrap();
        let AudioSource::Bytes { data, file_name } = src else {
            panic!("expected in-memory audio");
        };
        assert_eq!(file_name, "audio.wav");
        assert_eq!(data.len(), 44 + 32000);
        let info = WavInfo::parse(&data).unwrap();
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.frames, 16000);
        assert!((info.duration_seconds - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_base64_wav_passes_through() {
        let mut wav = wav_header(4, &AudioFormat::default()).to_vec();
        wav.extend_from_slice(&[1, 2, 3, 4]);
        let src = AudioSource::from_base64(&STANDARD.encode(&wav), None).unwrap();
        assert_eq!(src, AudioSource::from_bytes(wav, "audio.wav"));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let err = AudioSource::from_base64("@@not base64@@", None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidRequest);
        assert!(AudioSource::from_base64("", None).is_err());
    }

    #[test]
    fn test_normalized_falls_back_per_field() {
        let f = AudioFormat::new(12345, 6, 16).normalized();
        assert_eq!(f, AudioFormat::new(48000, 1, 16));
        let ok = AudioFormat::new(44100, 2, 24);
        assert_eq!(ok.normalized(), ok);
    }

    #[test]
    fn test_format_deserializes_camel_case() {
        let f: AudioFormat = serde_json::from_str(r#"{"sampleRate": 16000}"#).unwrap();
        assert_eq!(f, AudioFormat::new(16000, 1, 16));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(WavInfo::parse(b"not a wav file at all").is_err());
        let mut truncated = wav_header(0, &AudioFormat::default()).to_vec();
        truncated.truncate(20);
        assert!(WavInfo::parse(&truncated).is_err());
    }

    #[test]
    fn test_parse_rejects_oversized_frame() {
        let mut wav = wav_header(4, &AudioFormat::default()).to_vec();
        wav[22..24].copy_from_slice(&u16::MAX.to_le_bytes());
        wav[34..36].copy_from_slice(&u16::MAX.to_le_bytes());
        wav.extend_from_slice(&[0u8; 4]);
        let err = WavInfo::parse(&wav).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_read_missing_file_is_engine_fault() {
        let err = AudioSource::from_path("/definitely/not/here.wav")
            .read()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Engine);
    }
}
