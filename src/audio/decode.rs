//! Audio decoding for the trimmer.
//!
//! Accepts recorded blobs and uploaded files in any container symphonia
//! understands and produces the first channel as f32 samples, which is all the
//! waveform and selection math needs.

use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use crate::error::CaptureError;

/// A decoded audio source, fixed for the lifetime of a trimmer load.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// First-channel samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Total decoded length in seconds
    pub duration_seconds: f64,
}

/// Decode an in-memory audio blob.
///
/// Malformed or unsupported input is a recoverable [`CaptureError::Decode`];
/// the caller stays in its pre-call state and may retry with another source.
pub fn decode_blob(bytes: &[u8]) -> Result<DecodedAudio, CaptureError> {
    if bytes.is_empty() {
        return Err(CaptureError::Decode("empty audio source".to_string()));
    }

    let mss = MediaSourceStream::new(
        Box::new(Cursor::new(bytes.to_vec())),
        Default::default(),
    );

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| CaptureError::Decode(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| CaptureError::Decode("no audio track found".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| CaptureError::Decode(e.to_string()))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(CaptureError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packet; skip it and keep going
                warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(CaptureError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channel_count = spec.channels.count().max(1);

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        // First channel only: indices 0, n, 2n, ... of the interleaved buffer
        samples.extend(buf.samples().iter().step_by(channel_count));
    }

    if samples.is_empty() {
        return Err(CaptureError::Decode(
            "no audio samples decoded".to_string(),
        ));
    }

    let duration_seconds = samples.len() as f64 / sample_rate as f64;

    info!(
        "Audio decoded: {:.1}s, {}Hz, {} samples",
        duration_seconds,
        sample_rate,
        samples.len()
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        duration_seconds,
    })
}

/// Decode an audio file from disk (uploaded-file trimming path).
pub fn decode_file(path: impl AsRef<Path>) -> Result<DecodedAudio, CaptureError> {
    let path = path.as_ref();
    debug!("Decoding audio file: {}", path.display());

    let bytes = std::fs::read(path)
        .map_err(|e| CaptureError::Decode(format!("{}: {}", path.display(), e)))?;

    decode_blob(&bytes)
}
