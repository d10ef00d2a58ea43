use serde::{Deserialize, Serialize};

use crate::audio::AudioBlob;
use crate::trimmer::TrimSelection;

/// Trim metadata forwarded to the save pipeline.
///
/// Bounds only — this crate never cuts audio; the collaborator owning the
/// upload materializes the clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimBounds {
    pub start_time: f64,
    pub end_time: f64,
}

/// What the external save pipeline receives for one recording.
#[derive(Debug, Clone)]
pub struct SavePayload {
    pub blob: AudioBlob,
    /// None when the selection covers the whole clip
    pub trim: Option<TrimBounds>,
}

impl SavePayload {
    pub fn new(blob: AudioBlob, selection: Option<TrimSelection>) -> Self {
        let trim = selection
            .filter(|s| !s.is_full_audio())
            .map(|s| TrimBounds {
                start_time: s.start_time,
                end_time: s.end_time,
            });

        Self { blob, trim }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> AudioBlob {
        AudioBlob {
            bytes: vec![1, 2, 3],
            mime_type: "audio/wav".to_string(),
            duration_secs: 10.0,
        }
    }

    #[test]
    fn test_full_audio_selection_sends_no_trim_metadata() {
        let selection = TrimSelection::full(10.0);
        let payload = SavePayload::new(blob(), Some(selection));
        assert!(payload.trim.is_none());
    }

    #[test]
    fn test_near_full_selection_sends_no_trim_metadata() {
        let selection = TrimSelection {
            start_time: 0.0,
            end_time: 9.95,
            duration: 10.0,
        };
        let payload = SavePayload::new(blob(), Some(selection));
        assert!(payload.trim.is_none());
    }

    #[test]
    fn test_trimmed_selection_sends_bounds() {
        let selection = TrimSelection {
            start_time: 2.0,
            end_time: 5.0,
            duration: 10.0,
        };
        let payload = SavePayload::new(blob(), Some(selection));
        assert_eq!(
            payload.trim,
            Some(TrimBounds {
                start_time: 2.0,
                end_time: 5.0
            })
        );
    }

    #[test]
    fn test_no_selection_sends_no_trim_metadata() {
        let payload = SavePayload::new(blob(), None);
        assert!(payload.trim.is_none());
    }
}
