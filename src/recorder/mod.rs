//! Device capture state machine.
//!
//! Owns the microphone backend and produces at most one recorded blob per
//! session: `Idle -> PermissionGranted -> Recording -> Stopped`, with
//! `cleanup` returning any state to `Idle`. Timer feedback, the 60-second
//! auto-stop and user-facing failures all surface as [`RecorderEvent`]s on a
//! channel the host UI drains; no operation panics or propagates an error.

mod progress;

pub use progress::{format_elapsed, ProgressLevel};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::audio::format::{self, AudioBlob, EncodingFormat, Negotiated, DEFAULT_MIME_TYPE};
use crate::audio::{CaptureBackend, CaptureChunk};
use crate::config::RecordingConfig;
use crate::error::CaptureError;

/// Recording session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    PermissionPending,
    PermissionGranted,
    Recording,
    Stopped,
}

/// Feedback events for the host UI
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// 1 Hz timer tick while recording
    Tick {
        elapsed_secs: u64,
        /// Elapsed time as a fraction of the ceiling
        ratio: f64,
        level: ProgressLevel,
    },
    /// A recoverable failure, already converted to a user-facing message
    Error { message: String },
    /// The 60-second ceiling forced the recording to end
    AutoStopped,
    /// Recording ended and the blob is materialized
    Stopped { duration_secs: f64 },
}

struct RecorderShared {
    config: RecordingConfig,
    backend: Mutex<Box<dyn CaptureBackend>>,
    state: StdMutex<RecorderState>,
    /// Ordered capture fragments, appended as they arrive
    chunks: StdMutex<Vec<CaptureChunk>>,
    /// At most one non-None blob per session
    blob: StdMutex<Option<AudioBlob>>,
    negotiated: StdMutex<Option<Negotiated>>,
    started_at: StdMutex<Option<tokio::time::Instant>>,
    /// Guards blob materialization: auto-stop and manual stop are mutually
    /// idempotent, only the first caller proceeds
    stop_pending: AtomicBool,
    events: UnboundedSender<RecorderEvent>,
    collector_handle: Mutex<Option<JoinHandle<()>>>,
    ticker_handle: Mutex<Option<JoinHandle<()>>>,
    auto_stop_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Microphone recorder: one device stream, one blob per session.
pub struct Recorder {
    shared: Arc<RecorderShared>,
}

impl Recorder {
    /// Create a recorder around a capture backend.
    ///
    /// The returned receiver delivers [`RecorderEvent`]s until the recorder
    /// is dropped.
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        config: RecordingConfig,
    ) -> (Self, UnboundedReceiver<RecorderEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(RecorderShared {
            config,
            backend: Mutex::new(backend),
            state: StdMutex::new(RecorderState::Idle),
            chunks: StdMutex::new(Vec::new()),
            blob: StdMutex::new(None),
            negotiated: StdMutex::new(None),
            started_at: StdMutex::new(None),
            stop_pending: AtomicBool::new(false),
            events,
            collector_handle: Mutex::new(None),
            ticker_handle: Mutex::new(None),
            auto_stop_handle: Mutex::new(None),
        });

        (Self { shared }, events_rx)
    }

    pub fn state(&self) -> RecorderState {
        *self.shared.state.lock().unwrap()
    }

    /// Request exclusive access to the audio input device.
    ///
    /// Re-entrant: calling again once granted is a no-op returning true. On
    /// failure the error is classified, a user-facing message is emitted as
    /// an event, and the recorder returns to `Idle`.
    pub async fn request_permission(&self) -> bool {
        {
            let state = self.shared.state.lock().unwrap();
            match *state {
                RecorderState::PermissionGranted
                | RecorderState::Recording
                | RecorderState::Stopped => return true,
                RecorderState::PermissionPending => return false,
                RecorderState::Idle => {}
            }
        }

        self.shared.set_state(RecorderState::PermissionPending);

        let result = self.shared.backend.lock().await.open().await;
        match result {
            Ok(()) => {
                info!("Microphone permission granted");
                self.shared.set_state(RecorderState::PermissionGranted);
                true
            }
            Err(e) => {
                warn!("Microphone permission request failed: {}", e);
                self.shared.emit_error(&e);
                self.shared.set_state(RecorderState::Idle);
                false
            }
        }
    }

    /// Begin capturing.
    ///
    /// Requires a granted device stream; negotiates the encoding format,
    /// starts the chunk collector, the 1 Hz timer and the auto-stop deadline.
    /// Returns false without state corruption when no stream is held or the
    /// backend fails to initialize.
    pub async fn start_recording(&self) -> bool {
        if self.state() != RecorderState::PermissionGranted {
            warn!("start_recording called without a granted device stream");
            return false;
        }

        let negotiated = {
            let backend = self.shared.backend.lock().await;
            format::negotiate(|fmt| backend.supports(fmt))
        };

        // A negotiated container we cannot encode is an init failure; the
        // session stays in PermissionGranted for a retry.
        if let Some(fmt) = negotiated.format() {
            if !fmt.has_encoder() {
                let e = CaptureError::RecordingStart(format!(
                    "no encoder available for {}",
                    fmt.mime_type()
                ));
                error!("{}", e);
                self.shared.emit_error(&e);
                return false;
            }
        }

        let chunk_rx = match self.shared.backend.lock().await.start().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Failed to start capture: {}", e);
                let e = match e {
                    CaptureError::RecordingStart(_) => e,
                    other => CaptureError::RecordingStart(other.to_string()),
                };
                self.shared.emit_error(&e);
                return false;
            }
        };

        self.shared.stop_pending.store(false, Ordering::SeqCst);
        self.shared.chunks.lock().unwrap().clear();
        *self.shared.blob.lock().unwrap() = None;
        *self.shared.negotiated.lock().unwrap() = Some(negotiated);
        *self.shared.started_at.lock().unwrap() = Some(tokio::time::Instant::now());

        self.spawn_collector(chunk_rx).await;
        self.spawn_ticker().await;
        self.spawn_auto_stop().await;

        self.shared.set_state(RecorderState::Recording);
        info!(
            "Recording started (ceiling: {}s)",
            self.shared.config.max_duration_secs
        );
        true
    }

    /// Stop capturing and materialize the blob.
    ///
    /// Idempotent with the auto-stop path: exactly one blob per session, a
    /// second call is a no-op returning false.
    pub async fn stop_recording(&self) -> bool {
        RecorderShared::do_stop(&self.shared, false).await
    }

    /// The finished recording, available once stopped.
    pub fn recorded_blob(&self) -> Option<AudioBlob> {
        self.shared.blob.lock().unwrap().clone()
    }

    /// Seconds elapsed since recording started.
    pub fn elapsed_secs(&self) -> u64 {
        self.shared
            .started_at
            .lock()
            .unwrap()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    /// Tear down from any state: cancel timers and the auto-stop deadline,
    /// release the device stream, drop chunks and blob. Idempotent.
    pub async fn cleanup(&self) {
        debug!("Recorder cleanup");

        for handle in [
            &self.shared.ticker_handle,
            &self.shared.auto_stop_handle,
            &self.shared.collector_handle,
        ] {
            if let Some(task) = handle.lock().await.take() {
                task.abort();
            }
        }

        {
            let mut backend = self.shared.backend.lock().await;
            backend.close().await;
        }

        self.shared.chunks.lock().unwrap().clear();
        *self.shared.blob.lock().unwrap() = None;
        *self.shared.negotiated.lock().unwrap() = None;
        *self.shared.started_at.lock().unwrap() = None;
        self.shared.stop_pending.store(false, Ordering::SeqCst);
        self.shared.set_state(RecorderState::Idle);
    }

    async fn spawn_collector(&self, mut chunk_rx: mpsc::Receiver<CaptureChunk>) {
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            // Single consumer: arrival order is preserved
            while let Some(chunk) = chunk_rx.recv().await {
                shared.chunks.lock().unwrap().push(chunk);
            }
            debug!("Chunk collector drained");
        });

        *self.shared.collector_handle.lock().await = Some(task);
    }

    async fn spawn_ticker(&self) {
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await; // first tick fires immediately

            loop {
                interval.tick().await;

                let elapsed_secs = shared
                    .started_at
                    .lock()
                    .unwrap()
                    .map(|t| t.elapsed().as_secs())
                    .unwrap_or(0);
                let ratio = elapsed_secs as f64 / shared.config.max_duration_secs as f64;

                let _ = shared.events.send(RecorderEvent::Tick {
                    elapsed_secs,
                    ratio,
                    level: ProgressLevel::from_ratio(ratio),
                });
            }
        });

        *self.shared.ticker_handle.lock().await = Some(task);
    }

    async fn spawn_auto_stop(&self) {
        let shared = Arc::clone(&self.shared);
        let deadline = Duration::from_secs(shared.config.max_duration_secs);

        let task = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            info!("Recording ceiling reached, auto-stopping");
            RecorderShared::do_stop(&shared, true).await;
        });

        *self.shared.auto_stop_handle.lock().await = Some(task);
    }
}

impl RecorderShared {
    fn set_state(&self, state: RecorderState) {
        *self.state.lock().unwrap() = state;
    }

    fn emit_error(&self, error: &CaptureError) {
        let _ = self.events.send(RecorderEvent::Error {
            message: error.user_message().to_string(),
        });
    }

    /// Shared stop path for manual stop and the auto-stop deadline.
    async fn do_stop(shared: &Arc<Self>, auto: bool) -> bool {
        {
            let state = shared.state.lock().unwrap();
            if *state != RecorderState::Recording {
                return false;
            }
        }

        // First caller wins; the loser is a safe no-op
        if shared.stop_pending.swap(true, Ordering::SeqCst) {
            return false;
        }

        // Cancel the timers. The auto-stop task must not abort itself
        // mid-stop, so its handle is only aborted on the manual path.
        if let Some(task) = shared.ticker_handle.lock().await.take() {
            task.abort();
        }
        {
            let auto_task = shared.auto_stop_handle.lock().await.take();
            if let (false, Some(task)) = (auto, auto_task) {
                task.abort();
            }
        }

        // Halt capture; the backend flushes its final chunk and closes the
        // channel, which is the sole trigger for blob materialization.
        let native_format = {
            let mut backend = shared.backend.lock().await;
            if let Err(e) = backend.stop().await {
                warn!("Error stopping capture backend: {}", e);
            }
            backend.native_format()
        };

        if let Some(task) = shared.collector_handle.lock().await.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("Chunk collector panicked: {}", e);
                }
            }
        }

        let blob = shared.materialize_blob(native_format);
        let duration_secs = blob.duration_secs;

        info!(
            "Recording stopped: {:.2}s, {} bytes, {} ({})",
            duration_secs,
            blob.len(),
            blob.mime_type,
            if auto { "auto" } else { "manual" }
        );

        *shared.blob.lock().unwrap() = Some(blob);
        shared.set_state(RecorderState::Stopped);

        if auto {
            let _ = shared.events.send(RecorderEvent::AutoStopped);
        }
        let _ = shared.events.send(RecorderEvent::Stopped { duration_secs });

        true
    }

    /// Concatenate the buffered fragments, in arrival order, into the
    /// immutable session blob. The mime tag prefers the negotiated format,
    /// then the backend's native container, then the `audio/webm` default.
    fn materialize_blob(&self, native_format: Option<EncodingFormat>) -> AudioBlob {
        let chunks = std::mem::take(&mut *self.chunks.lock().unwrap());

        let sample_rate = chunks.first().map(|c| c.sample_rate).unwrap_or(44_100);
        let channels = chunks.first().map(|c| c.channels).unwrap_or(1).max(1);

        let mut samples = Vec::new();
        for chunk in &chunks {
            samples.extend_from_slice(&chunk.samples);
        }

        let duration_secs =
            samples.len() as f64 / (sample_rate as f64 * channels as f64);

        let bytes = match format::encode_wav(&samples, sample_rate, channels) {
            Ok(bytes) => bytes,
            Err(e) => {
                // Encoding a buffer we already hold should not fail; degrade
                // to an empty blob rather than losing the stop transition.
                error!("Blob materialization failed: {}", e);
                Vec::new()
            }
        };

        let negotiated = *self.negotiated.lock().unwrap();
        let mime_type = negotiated
            .and_then(|n| n.format())
            .or(native_format)
            .map(|f| f.mime_type().to_string())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        AudioBlob {
            bytes,
            mime_type,
            duration_secs,
        }
    }
}
