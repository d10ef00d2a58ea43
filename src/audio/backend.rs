use tokio::sync::mpsc;

use super::format::EncodingFormat;
use crate::config::AudioConfig;
use crate::error::CaptureError;

/// One fragment of captured audio (16-bit PCM, interleaved).
///
/// Chunks arrive in the order the device emitted them; the recorder buffers
/// them as-is and concatenates them into the final blob without reordering.
#[derive(Debug, Clone)]
pub struct CaptureChunk {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for a capture backend
#[derive(Debug, Clone)]
pub struct CaptureBackendConfig {
    /// Target sample rate (device rate wins if it differs)
    pub sample_rate: u32,
    /// Target channel count (1 = mono)
    pub channels: u16,
    /// Ask the platform for echo cancellation
    pub echo_cancellation: bool,
    /// Ask the platform for noise suppression
    pub noise_suppression: bool,
    /// Chunk emission interval; must be at most 1000ms so the recorder sees
    /// at least one fragment per second
    pub chunk_interval_ms: u64,
}

impl Default for CaptureBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            echo_cancellation: true,
            noise_suppression: true,
            chunk_interval_ms: 1000,
        }
    }
}

impl CaptureBackendConfig {
    pub fn from_audio_config(audio: &AudioConfig, chunk_interval_ms: u64) -> Self {
        Self {
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            echo_cancellation: audio.echo_cancellation,
            noise_suppression: audio.noise_suppression,
            chunk_interval_ms: chunk_interval_ms.min(1000),
        }
    }
}

/// Audio capture capability the recorder drives.
///
/// Implementations own the device stream exclusively: `open` acquires it
/// (surfacing permission and device failures as classified errors), `close`
/// releases it, and at most one consumer holds it at a time.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Request exclusive access to the input device.
    ///
    /// Calling `open` while already open is a no-op.
    async fn open(&mut self) -> Result<(), CaptureError>;

    /// Begin capturing audio.
    ///
    /// Returns a channel receiver delivering chunks in temporal order, at
    /// least once per second. The sender side is dropped once the device has
    /// flushed its final data after [`CaptureBackend::stop`].
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureChunk>, CaptureError>;

    /// Stop capturing and flush the final chunk. Safe to call when idle.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Release the device stream entirely. Idempotent.
    async fn close(&mut self);

    /// Whether the device stream is currently held
    fn is_open(&self) -> bool;

    /// Whether capture is running
    fn is_capturing(&self) -> bool;

    /// Capability probe for the format negotiation
    fn supports(&self, format: EncodingFormat) -> bool;

    /// Container the backend natively produces, if known
    fn native_format(&self) -> Option<EncodingFormat>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    /// Create the platform microphone backend.
    pub fn create(config: CaptureBackendConfig) -> Box<dyn CaptureBackend> {
        Box::new(super::cpal_backend::CpalBackend::new(config))
    }
}
