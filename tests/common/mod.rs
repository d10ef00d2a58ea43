// Shared test doubles for the capture/trim integration tests.
//
// ScriptedBackend stands in for the microphone: it emits one chunk per
// second of (virtual) time until stopped, with each chunk's samples tagged by
// its sequence number so ordering is observable. ScriptedSink stands in for
// the audio output and advances its playhead with the tokio clock.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use voicebook_capture::{CaptureBackend, CaptureChunk, CaptureError, EncodingFormat, PlaybackSink};

pub const SAMPLES_PER_CHUNK: usize = 44_100;

pub struct ScriptedBackend {
    /// Error to return from `open`, if any
    open_error: Option<CaptureError>,
    supported: Vec<EncodingFormat>,
    native: Option<EncodingFormat>,
    open: bool,
    capturing: bool,
    stop_tx: Option<watch::Sender<bool>>,
    /// Observable from outside: set once the device stream is released
    pub closed: Arc<AtomicBool>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            open_error: None,
            supported: Vec::new(),
            native: Some(EncodingFormat::Wav),
            open: false,
            capturing: false,
            stop_tx: None,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing_open(error: CaptureError) -> Self {
        let mut backend = Self::new();
        backend.open_error = Some(error);
        backend
    }

    pub fn with_supported(mut self, supported: Vec<EncodingFormat>) -> Self {
        self.supported = supported;
        self
    }

    pub fn with_native(mut self, native: Option<EncodingFormat>) -> Self {
        self.native = native;
        self
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ScriptedBackend {
    async fn open(&mut self) -> Result<(), CaptureError> {
        if let Some(error) = self.open_error.clone() {
            return Err(error);
        }
        self.open = true;
        Ok(())
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureChunk>, CaptureError> {
        if !self.open {
            return Err(CaptureError::RecordingStart("not open".to_string()));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        self.stop_tx = Some(stop_tx);
        self.capturing = true;

        tokio::spawn(async move {
            let mut sequence: i16 = 0;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        let chunk = CaptureChunk {
                            samples: vec![sequence * 100; SAMPLES_PER_CHUNK],
                            sample_rate: 44_100,
                            channels: 1,
                            timestamp_ms: (sequence as u64 + 1) * 1000,
                        };
                        if chunk_tx.send(chunk).await.is_err() {
                            break;
                        }
                        sequence += 1;
                    }
                    _ = stop_rx.changed() => break,
                }
            }
            // Dropping chunk_tx is the final-flush signal
        });

        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        self.capturing = false;
        Ok(())
    }

    async fn close(&mut self) {
        let _ = self.stop().await;
        self.open = false;
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn supports(&self, format: EncodingFormat) -> bool {
        self.supported.contains(&format)
    }

    fn native_format(&self) -> Option<EncodingFormat> {
        self.native
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Playback double whose playhead follows the (virtual) tokio clock.
pub struct ScriptedSink {
    duration: f64,
    base_position: f64,
    play_started: Option<tokio::time::Instant>,
    pub pause_count: usize,
    pub seek_positions: Vec<f64>,
}

impl ScriptedSink {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            base_position: 0.0,
            play_started: None,
            pause_count: 0,
            seek_positions: Vec::new(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.play_started.is_some()
    }

    fn current_position(&self) -> f64 {
        let elapsed = self
            .play_started
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base_position + elapsed).min(self.duration)
    }
}

impl PlaybackSink for ScriptedSink {
    fn seek(&mut self, position_secs: f64) {
        self.seek_positions.push(position_secs);
        self.base_position = position_secs.clamp(0.0, self.duration);
        if self.play_started.is_some() {
            self.play_started = Some(tokio::time::Instant::now());
        }
    }

    fn play(&mut self) {
        if self.play_started.is_none() {
            self.play_started = Some(tokio::time::Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base_position = self.current_position();
        self.play_started = None;
        self.pause_count += 1;
    }

    fn position_secs(&self) -> f64 {
        self.current_position()
    }

    fn is_finished(&self) -> bool {
        self.current_position() >= self.duration
    }
}

/// In-memory WAV of a quiet sine tone.
pub fn sine_wav_bytes(duration_secs: f64, sample_rate: u32) -> Vec<u8> {
    let sample_count = (duration_secs * sample_rate as f64) as usize;
    let samples: Vec<i16> = (0..sample_count)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            ((t * 440.0 * std::f64::consts::TAU).sin() * 8000.0) as i16
        })
        .collect();

    voicebook_capture::encode_wav(&samples, sample_rate, 1).expect("encode fixture")
}
