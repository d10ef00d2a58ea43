//! Microphone capture backend built on cpal.
//!
//! `cpal::Stream` is not `Send`, so the stream lives on a dedicated worker
//! thread. The audio callback appends converted samples to a shared buffer and
//! the worker drains it into [`CaptureChunk`]s on the configured interval,
//! flushing one final chunk when stopped.

use std::sync::mpsc::RecvTimeoutError;
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::backend::{CaptureBackend, CaptureBackendConfig, CaptureChunk};
use super::format::EncodingFormat;
use crate::error::CaptureError;

pub struct CpalBackend {
    config: CaptureBackendConfig,
    /// Actual device sample rate, known after `open`
    device_sample_rate: u32,
    open: bool,
    worker: Option<CaptureWorker>,
}

struct CaptureWorker {
    stop_tx: std_mpsc::Sender<()>,
    handle: std::thread::JoinHandle<()>,
}

impl CpalBackend {
    pub fn new(config: CaptureBackendConfig) -> Self {
        Self {
            config,
            device_sample_rate: 0,
            open: false,
            worker: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for CpalBackend {
    async fn open(&mut self) -> Result<(), CaptureError> {
        if self.open {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::DeviceNotFound)?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());

        let device_config = device
            .default_input_config()
            .map_err(classify_config_error)?;

        let device_sample_rate = device_config.sample_rate().0;
        if device_sample_rate != self.config.sample_rate {
            warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Capturing at device rate.",
                self.config.sample_rate, device_sample_rate
            );
        }

        debug!(
            "echo_cancellation={} noise_suppression={} (applied by the platform where supported)",
            self.config.echo_cancellation, self.config.noise_suppression
        );

        info!(
            "Capture device acquired: {} ({}Hz, {} channels)",
            device_name,
            device_sample_rate,
            device_config.channels()
        );

        self.device_sample_rate = device_sample_rate;
        self.open = true;
        Ok(())
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureChunk>, CaptureError> {
        if !self.open {
            return Err(CaptureError::RecordingStart(
                "device stream is not open".to_string(),
            ));
        }
        if self.worker.is_some() {
            return Err(CaptureError::RecordingStart(
                "capture already running".to_string(),
            ));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();

        let target_channels = self.config.channels;
        let interval = Duration::from_millis(self.config.chunk_interval_ms.clamp(1, 1000));

        let handle = std::thread::spawn(move || {
            let built = build_stream(target_channels);
            let (stream, buffer, sample_rate) = match built {
                Ok(parts) => parts,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let _ = ready_tx.send(Ok(()));
            let started = Instant::now();

            loop {
                let stop = match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
                    Err(RecvTimeoutError::Timeout) => false,
                };

                let samples = {
                    let mut buf = buffer.lock().unwrap();
                    std::mem::take(&mut *buf)
                };

                if !samples.is_empty() {
                    let chunk = CaptureChunk {
                        samples,
                        sample_rate,
                        channels: target_channels,
                        timestamp_ms: started.elapsed().as_millis() as u64,
                    };
                    if chunk_tx.blocking_send(chunk).is_err() {
                        break;
                    }
                }

                if stop {
                    break;
                }
            }

            drop(stream);
            debug!("Capture worker thread exited");
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                self.worker = Some(CaptureWorker { stop_tx, handle });
                info!("Microphone capture started");
                Ok(chunk_rx)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CaptureError::RecordingStart(
                    "capture worker exited unexpectedly".to_string(),
                ))
            }
        }
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let join = tokio::task::spawn_blocking(move || worker.handle.join());
            if let Ok(Err(_)) = join.await {
                return Err(CaptureError::Device(
                    "capture worker panicked".to_string(),
                ));
            }
            info!("Microphone capture stopped");
        }
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.stop().await {
            warn!("Error stopping capture during close: {}", e);
        }
        if self.open {
            debug!("Capture device released");
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn is_capturing(&self) -> bool {
        self.worker.is_some()
    }

    fn supports(&self, _format: EncodingFormat) -> bool {
        // cpal delivers PCM; none of the preferred encoded containers are
        // produced by this backend, so negotiation falls through to the
        // platform default.
        false
    }

    fn native_format(&self) -> Option<EncodingFormat> {
        Some(EncodingFormat::Wav)
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }
}

type BuiltStream = (cpal::Stream, Arc<Mutex<Vec<i16>>>, u32);

/// Build and start the input stream on the worker thread.
fn build_stream(target_channels: u16) -> Result<BuiltStream, CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(CaptureError::DeviceNotFound)?;

    let supported = device
        .default_input_config()
        .map_err(classify_config_error)?;

    let sample_format = supported.sample_format();
    let device_channels = supported.channels() as usize;
    let sample_rate = supported.sample_rate().0;
    let stream_config: cpal::StreamConfig = supported.into();

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let downmix = target_channels == 1 && device_channels > 1;

    let stream = match sample_format {
        cpal::SampleFormat::I16 => {
            let cb_buffer = Arc::clone(&buffer);
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    push_samples(&cb_buffer, data, device_channels, downmix);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
        }
        cpal::SampleFormat::F32 => {
            let cb_buffer = Arc::clone(&buffer);
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<i16> = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();
                    push_samples(&cb_buffer, &converted, device_channels, downmix);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
        }
        other => {
            return Err(CaptureError::Device(format!(
                "unsupported device sample format: {other}"
            )))
        }
    }
    .map_err(classify_build_error)?;

    stream
        .play()
        .map_err(|e| CaptureError::Device(e.to_string()))?;

    Ok((stream, buffer, sample_rate))
}

/// Append incoming samples, averaging interleaved channels to mono if asked.
fn push_samples(
    buffer: &Arc<Mutex<Vec<i16>>>,
    data: &[i16],
    device_channels: usize,
    downmix: bool,
) {
    let mut samples = buffer.lock().unwrap();

    if !downmix || device_channels <= 1 {
        samples.extend_from_slice(data);
        return;
    }

    for frame in data.chunks_exact(device_channels) {
        let sum: i32 = frame.iter().map(|&s| s as i32).sum();
        samples.push((sum / device_channels as i32) as i16);
    }
}

fn classify_config_error(err: cpal::DefaultStreamConfigError) -> CaptureError {
    match err {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => CaptureError::DeviceNotFound,
        other => classify_message(other.to_string()),
    }
}

fn classify_build_error(err: cpal::BuildStreamError) -> CaptureError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceNotFound,
        other => classify_message(other.to_string()),
    }
}

/// Platform permission failures surface as backend-specific messages; key off
/// the text since cpal has no dedicated error variant for them.
fn classify_message(message: String) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not allowed") {
        CaptureError::PermissionDenied
    } else {
        CaptureError::Device(message)
    }
}
