use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use super::payload::SavePayload;
use super::stats::SessionStats;
use crate::audio::CaptureBackend;
use crate::config::Config;
use crate::error::CaptureError;
use crate::recorder::{Recorder, RecorderEvent, RecorderState};
use crate::trimmer::{AudioSource, Trimmer};

/// Which of the controller's two trimmers to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimmerKind {
    /// Trims the blob produced by this session's recorder
    Recorded,
    /// Trims a user-uploaded file
    Upload,
}

/// Owning context for one capture session.
///
/// Holds at most one recorder and exactly two independent trimmers, replacing
/// ambient globals with an explicit lifecycle: construct per modal open, call
/// [`CaptureController::dispose`] on close. The device stream has a single
/// owner at a time; opening a new recorder cleans up the previous one first.
pub struct CaptureController {
    config: Config,
    session_id: String,
    started_at: chrono::DateTime<Utc>,
    recorder: Option<Recorder>,
    recorded_trimmer: Trimmer,
    upload_trimmer: Trimmer,
}

impl CaptureController {
    pub fn new(config: Config) -> Self {
        let session_id = format!("capture-{}", uuid::Uuid::new_v4());
        info!("Capture session created: {}", session_id);

        Self {
            recorded_trimmer: Trimmer::new(config.waveform.clone()),
            upload_trimmer: Trimmer::new(config.waveform.clone()),
            config,
            session_id,
            started_at: Utc::now(),
            recorder: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Attach a capture backend, creating this session's recorder.
    ///
    /// Any previous recorder is cleaned up first so the device stream never
    /// has two owners. Returns the recorder's event receiver for the host UI.
    pub async fn open_recorder(
        &mut self,
        backend: Box<dyn CaptureBackend>,
    ) -> UnboundedReceiver<RecorderEvent> {
        if let Some(previous) = self.recorder.take() {
            debug!("Releasing previous recorder before reacquiring the device");
            previous.cleanup().await;
        }

        let (recorder, events) = Recorder::new(backend, self.config.recording.clone());
        self.recorder = Some(recorder);
        events
    }

    pub fn recorder(&self) -> Option<&Recorder> {
        self.recorder.as_ref()
    }

    pub fn trimmer(&self, kind: TrimmerKind) -> &Trimmer {
        match kind {
            TrimmerKind::Recorded => &self.recorded_trimmer,
            TrimmerKind::Upload => &self.upload_trimmer,
        }
    }

    pub fn trimmer_mut(&mut self, kind: TrimmerKind) -> &mut Trimmer {
        match kind {
            TrimmerKind::Recorded => &mut self.recorded_trimmer,
            TrimmerKind::Upload => &mut self.upload_trimmer,
        }
    }

    /// Hand the finished recording to the recorded-audio trimmer.
    pub fn load_recorded_into_trimmer(&mut self) -> Result<(), CaptureError> {
        let blob = self
            .recorder
            .as_ref()
            .and_then(|r| r.recorded_blob())
            .ok_or_else(|| {
                CaptureError::Decode("no recorded audio available to trim".to_string())
            })?;

        self.recorded_trimmer
            .load_audio(AudioSource::Bytes(blob.bytes))
    }

    /// Package blob + trim bounds for the external save pipeline.
    ///
    /// Returns None until a blob exists. A full-range selection (or no
    /// selection at all) yields `trim: None` — the server receives no trim
    /// metadata for an untrimmed recording.
    pub fn save_payload(&self) -> Option<SavePayload> {
        let blob = self.recorder.as_ref()?.recorded_blob()?;
        let selection = self.recorded_trimmer.selection();
        Some(SavePayload::new(blob, selection))
    }

    pub fn stats(&self) -> SessionStats {
        let recorder = self.recorder.as_ref();
        let is_recording = recorder
            .map(|r| r.state() == RecorderState::Recording)
            .unwrap_or(false);

        SessionStats {
            session_id: self.session_id.clone(),
            is_recording,
            started_at: self.started_at,
            elapsed_secs: recorder.map(|r| r.elapsed_secs()).unwrap_or(0),
            has_recorded_blob: recorder.map(|r| r.recorded_blob().is_some()).unwrap_or(false),
        }
    }

    /// Tear down the whole session: recorder stream, timers, decoded audio.
    /// Idempotent.
    pub async fn dispose(&mut self) {
        info!("Disposing capture session: {}", self.session_id);

        if let Some(recorder) = self.recorder.take() {
            recorder.cleanup().await;
        }
        self.recorded_trimmer.cleanup();
        self.upload_trimmer.cleanup();
    }
}
