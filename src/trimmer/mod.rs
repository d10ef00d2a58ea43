//! Waveform and range-selection engine.
//!
//! A trimmer consumes a decoded audio source (the recorder's blob or an
//! uploaded file), renders a min/max waveform, and lets the user pick a
//! `[start, end]` sub-range by pointer drag or numeric input. It produces a
//! *selection*, never a re-encoded clip; cutting the audio is the save
//! pipeline's job. Two instances routinely coexist (recorded + uploaded) and
//! share nothing.

mod playback;
mod waveform;

pub use playback::{play_bounded, PlaybackSink, RodioSink, FRAME_INTERVAL};
pub use waveform::{compute_peaks, render, ColumnPeak, SelectionOverlay, WaveformCanvas};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audio::decode::{decode_blob, decode_file, DecodedAudio};
use crate::config::WaveformConfig;
use crate::error::CaptureError;

/// Audio handed to a trimmer
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// In-memory bytes (the recorder's blob, or an uploaded file's contents)
    Bytes(Vec<u8>),
    /// A file on disk
    File(PathBuf),
}

/// The selected sub-range of a loaded audio source.
///
/// Invariant: `0 <= start_time <= end_time <= duration`, re-established after
/// every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimSelection {
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
}

impl TrimSelection {
    /// Slack under which a selection ending near the true end still counts as
    /// the whole clip.
    pub const FULL_AUDIO_EPSILON: f64 = 0.1;

    pub fn full(duration: f64) -> Self {
        Self {
            start_time: 0.0,
            end_time: duration,
            duration,
        }
    }

    /// True when the selection covers the whole clip; the save pipeline sends
    /// no trim metadata in that case.
    pub fn is_full_audio(&self) -> bool {
        self.start_time == 0.0 && self.duration - self.end_time < Self::FULL_AUDIO_EPSILON
    }
}

/// Trimmer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimmerState {
    /// No audio loaded
    Empty,
    /// Audio decoded, selection valid
    Loaded,
    /// Pointer held down, selection following the drag
    Selecting,
}

struct LoadedAudio {
    audio: DecodedAudio,
    selection: TrimSelection,
    peaks: Vec<ColumnPeak>,
    /// Anchor time while a pointer drag is in progress
    drag_anchor: Option<f64>,
}

/// Waveform + trim-selection component.
pub struct Trimmer {
    waveform: WaveformConfig,
    loaded: Option<LoadedAudio>,
}

impl Trimmer {
    pub fn new(waveform: WaveformConfig) -> Self {
        Self {
            waveform,
            loaded: None,
        }
    }

    pub fn state(&self) -> TrimmerState {
        match &self.loaded {
            None => TrimmerState::Empty,
            Some(loaded) if loaded.drag_anchor.is_some() => TrimmerState::Selecting,
            Some(_) => TrimmerState::Loaded,
        }
    }

    /// Decode a new audio source, replacing any previous one.
    ///
    /// On success the selection resets to the full range and the waveform is
    /// recomputed. On decode failure the trimmer is left empty and the error
    /// is returned for the host UI to surface; retrying with another source
    /// is always allowed.
    pub fn load_audio(&mut self, source: AudioSource) -> Result<(), CaptureError> {
        let decoded = match source {
            AudioSource::Bytes(bytes) => decode_blob(&bytes),
            AudioSource::File(path) => decode_file(&path),
        };

        let audio = match decoded {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Trimmer failed to load audio: {}", e);
                self.loaded = None;
                return Err(e);
            }
        };

        let peaks = compute_peaks(&audio.samples, self.waveform.width as usize);
        let selection = TrimSelection::full(audio.duration_seconds);

        info!(
            "Trimmer loaded {:.2}s of audio ({} waveform columns)",
            audio.duration_seconds,
            peaks.len()
        );

        self.loaded = Some(LoadedAudio {
            audio,
            selection,
            peaks,
            drag_anchor: None,
        });
        Ok(())
    }

    /// Total decoded length in seconds, fixed once loaded.
    pub fn duration(&self) -> Option<f64> {
        self.loaded.as_ref().map(|l| l.audio.duration_seconds)
    }

    /// The authoritative selection contract consumed by the save pipeline.
    pub fn selection(&self) -> Option<TrimSelection> {
        self.loaded.as_ref().map(|l| l.selection)
    }

    pub fn peaks(&self) -> &[ColumnPeak] {
        self.loaded.as_ref().map(|l| l.peaks.as_slice()).unwrap_or(&[])
    }

    pub fn overlay(&self) -> Option<SelectionOverlay> {
        self.selection()
            .map(|s| SelectionOverlay::from_selection(&s))
    }

    /// Draw the waveform through the host's canvas adapter.
    pub fn render(&self, canvas: &mut dyn WaveformCanvas) {
        if let Some(loaded) = &self.loaded {
            render(&loaded.peaks, self.waveform.height as f32, canvas);
        }
    }

    /// Set the selection start from the numeric input.
    ///
    /// The edited field wins: the value is clamped into `[0, duration]` and a
    /// crossed end bound is dragged up to match.
    pub fn set_start_time(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if let Some(loaded) = &mut self.loaded {
            let duration = loaded.audio.duration_seconds;
            loaded.selection.start_time = value.clamp(0.0, duration);
            if loaded.selection.end_time < loaded.selection.start_time {
                loaded.selection.end_time = loaded.selection.start_time;
            }
        }
    }

    /// Set the selection end from the numeric input; a crossed start bound is
    /// dragged down to match.
    pub fn set_end_time(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if let Some(loaded) = &mut self.loaded {
            let duration = loaded.audio.duration_seconds;
            loaded.selection.end_time = value.clamp(0.0, duration);
            if loaded.selection.start_time > loaded.selection.end_time {
                loaded.selection.start_time = loaded.selection.end_time;
            }
        }
    }

    /// Pointer down over the waveform: anchor the selection at the pointer.
    ///
    /// `x` is clamped into `[0, canvas_width]` and maps linearly to time.
    pub fn drag_start(&mut self, x: f64, canvas_width: f64) {
        if let Some(loaded) = &mut self.loaded {
            let time = x_to_time(x, canvas_width, loaded.audio.duration_seconds);
            loaded.drag_anchor = Some(time);
            loaded.selection.start_time = time;
            loaded.selection.end_time = time;
        }
    }

    /// Pointer move while held: selection is the normalized span between the
    /// anchor and the current pointer time.
    pub fn drag_move(&mut self, x: f64, canvas_width: f64) {
        if let Some(loaded) = &mut self.loaded {
            let Some(anchor) = loaded.drag_anchor else {
                return;
            };
            let time = x_to_time(x, canvas_width, loaded.audio.duration_seconds);
            loaded.selection.start_time = anchor.min(time);
            loaded.selection.end_time = anchor.max(time);
        }
    }

    /// Pointer up: the drag ends, the selection stays.
    pub fn drag_end(&mut self) {
        if let Some(loaded) = &mut self.loaded {
            loaded.drag_anchor = None;
        }
    }

    /// Restore the full-range selection.
    pub fn reset_selection(&mut self) {
        if let Some(loaded) = &mut self.loaded {
            loaded.selection = TrimSelection::full(loaded.audio.duration_seconds);
        }
    }

    /// Play the current selection on a sink, pausing at the selection end.
    ///
    /// No-op returning false when nothing is loaded.
    pub async fn play_selection(&self, sink: &mut dyn PlaybackSink) -> bool {
        let Some(selection) = self.selection() else {
            return false;
        };
        play_bounded(selection, sink).await;
        true
    }

    /// Release the decoded audio and waveform. Idempotent.
    pub fn cleanup(&mut self) {
        self.loaded = None;
    }
}

/// Linear pixel-to-time mapping with the pointer clamped to canvas bounds.
fn x_to_time(x: f64, canvas_width: f64, duration: f64) -> f64 {
    if canvas_width <= 0.0 {
        return 0.0;
    }
    let clamped = x.clamp(0.0, canvas_width);
    clamped / canvas_width * duration
}
