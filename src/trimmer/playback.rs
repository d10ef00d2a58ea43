//! Bounded playback of a trim selection.
//!
//! The core polls the sink once per animation frame and pauses it the moment
//! the playhead reaches the selection end. A selection touching the true end
//! of the audio plays out naturally instead of being paused.

use std::io::Cursor;
use std::time::Duration;

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, Sink};
use tracing::debug;

use crate::trimmer::TrimSelection;

/// Frame-polling cadence for position checks (~60 fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Playback capability driven by [`play_bounded`].
///
/// The adapter owns the actual audio output; the core only seeks, starts,
/// pauses and observes the playhead.
pub trait PlaybackSink {
    fn seek(&mut self, position_secs: f64);
    fn play(&mut self);
    fn pause(&mut self);
    /// Current playhead position in seconds
    fn position_secs(&self) -> f64;
    /// Whether the source has played to natural completion
    fn is_finished(&self) -> bool;
}

/// Play `selection` on the sink, pausing exactly when the playhead reaches
/// the selection end.
///
/// Only a selection ending before the true duration is bounded; otherwise the
/// audio runs to completion without an explicit pause.
pub async fn play_bounded(selection: TrimSelection, sink: &mut dyn PlaybackSink) {
    debug!(
        "Playing selection [{:.2}s, {:.2}s] of {:.2}s",
        selection.start_time, selection.end_time, selection.duration
    );

    sink.seek(selection.start_time);
    sink.play();

    let bounded = selection.end_time < selection.duration;
    let mut frame = tokio::time::interval(FRAME_INTERVAL);
    frame.tick().await; // first tick completes immediately

    loop {
        frame.tick().await;

        if bounded && sink.position_secs() >= selection.end_time {
            sink.pause();
            debug!("Selection end reached, playback paused");
            break;
        }

        if sink.is_finished() || sink.position_secs() >= selection.duration {
            debug!("Playback ran to completion");
            break;
        }
    }
}

/// Real audio output via rodio.
pub struct RodioSink {
    // Kept alive for the duration of playback; dropping it closes the device
    _stream: OutputStream,
    sink: Sink,
}

impl RodioSink {
    /// Prepare a paused sink over in-memory audio bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("No audio output device available")?;
        let sink = Sink::try_new(&handle).context("Failed to open audio output sink")?;

        let decoder =
            Decoder::new(Cursor::new(bytes)).context("Failed to decode audio for playback")?;
        sink.append(decoder);
        sink.pause();

        Ok(Self {
            _stream: stream,
            sink,
        })
    }
}

impl PlaybackSink for RodioSink {
    fn seek(&mut self, position_secs: f64) {
        let _ = self
            .sink
            .try_seek(Duration::from_secs_f64(position_secs.max(0.0)));
    }

    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn position_secs(&self) -> f64 {
        self.sink.get_pos().as_secs_f64()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
