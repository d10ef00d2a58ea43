//! Encoding format negotiation and recorded-blob materialization.
//!
//! The recorder probes the capture backend for container support in a fixed
//! preference order and tags the finished blob with the negotiated mime type.

use anyhow::Context;
use tracing::info;

use crate::error::CaptureError;

/// Mime type used when the negotiated container is unknown.
pub const DEFAULT_MIME_TYPE: &str = "audio/webm";

/// Audio container/codec combinations the recorder knows how to negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingFormat {
    OpusWebm,
    Webm,
    OpusOgg,
    Mp4,
    Wav,
}

impl EncodingFormat {
    /// Probe order: first supported format wins.
    pub const PREFERENCE: [EncodingFormat; 4] = [
        EncodingFormat::OpusWebm,
        EncodingFormat::Webm,
        EncodingFormat::OpusOgg,
        EncodingFormat::Mp4,
    ];

    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::OpusWebm => "audio/webm;codecs=opus",
            EncodingFormat::Webm => "audio/webm",
            EncodingFormat::OpusOgg => "audio/ogg;codecs=opus",
            EncodingFormat::Mp4 => "audio/mp4",
            EncodingFormat::Wav => "audio/wav",
        }
    }

    /// Whether this crate ships an encoder for the format.
    ///
    /// Only WAV is encoded locally; anything else must come pre-encoded from
    /// the backend, so negotiating it without backend support is a
    /// [`CaptureError::RecordingStart`] at start time.
    pub fn has_encoder(&self) -> bool {
        matches!(self, EncodingFormat::Wav)
    }
}

/// Outcome of the capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiated {
    /// One of the preferred formats is supported.
    Preferred(EncodingFormat),
    /// No preferred format is supported; the backend captures in whatever
    /// container it natively produces.
    PlatformDefault,
}

impl Negotiated {
    pub fn format(&self) -> Option<EncodingFormat> {
        match self {
            Negotiated::Preferred(format) => Some(*format),
            Negotiated::PlatformDefault => None,
        }
    }
}

/// Evaluate the probe against the preference list, strictly in order.
///
/// The probe is consulted once per format and never again after the first
/// match; a platform supporting only MP4 selects MP4 without the higher
/// preferences being revisited.
pub fn negotiate(mut probe: impl FnMut(EncodingFormat) -> bool) -> Negotiated {
    for format in EncodingFormat::PREFERENCE {
        if probe(format) {
            info!("Negotiated recording format: {}", format.mime_type());
            return Negotiated::Preferred(format);
        }
    }

    info!("No preferred recording format supported, using platform default");
    Negotiated::PlatformDefault
}

/// A finished recording (or uploaded file) as an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub duration_secs: f64,
}

impl AudioBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode mono/interleaved PCM samples into an in-memory WAV blob.
pub fn encode_wav(
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut bytes = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut bytes);
        let mut writer = hound::WavWriter::new(cursor, spec)
            .context("Failed to create WAV writer")
            .map_err(|e| CaptureError::RecordingStart(e.to_string()))?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| CaptureError::RecordingStart(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| CaptureError::RecordingStart(e.to_string()))?;
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_prefers_opus_webm() {
        let negotiated = negotiate(|_| true);
        assert_eq!(
            negotiated,
            Negotiated::Preferred(EncodingFormat::OpusWebm)
        );
    }

    #[test]
    fn test_negotiate_mp4_only_platform() {
        // A platform supporting only MP4 must select MP4, and the probe must
        // have been asked about every higher preference exactly once first.
        let mut asked = Vec::new();
        let negotiated = negotiate(|format| {
            asked.push(format);
            format == EncodingFormat::Mp4
        });

        assert_eq!(negotiated, Negotiated::Preferred(EncodingFormat::Mp4));
        assert_eq!(
            asked,
            vec![
                EncodingFormat::OpusWebm,
                EncodingFormat::Webm,
                EncodingFormat::OpusOgg,
                EncodingFormat::Mp4,
            ]
        );
    }

    #[test]
    fn test_negotiate_stops_at_first_match() {
        let mut asked = Vec::new();
        let negotiated = negotiate(|format| {
            asked.push(format);
            format == EncodingFormat::Webm
        });

        assert_eq!(negotiated, Negotiated::Preferred(EncodingFormat::Webm));
        assert!(!asked.contains(&EncodingFormat::OpusOgg));
        assert!(!asked.contains(&EncodingFormat::Mp4));
    }

    #[test]
    fn test_negotiate_falls_back_to_platform_default() {
        let negotiated = negotiate(|_| false);
        assert_eq!(negotiated, Negotiated::PlatformDefault);
        assert_eq!(negotiated.format(), None);
    }

    #[test]
    fn test_encode_wav_produces_riff_header() {
        let samples = vec![0i16; 4410];
        let bytes = encode_wav(&samples, 44_100, 1).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 16-bit mono: two bytes per sample plus 44-byte header
        assert_eq!(bytes.len(), 44 + samples.len() * 2);
    }
}
