use thiserror::Error;

/// Recoverable failures surfaced by the capture and trim components.
///
/// None of these terminate a session: every component catches the failure at
/// its origin, reports it, and returns to its pre-call state. The host UI maps
/// each kind to a message via [`CaptureError::user_message`].
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// The user (or platform) refused microphone access.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// No audio input device is available.
    #[error("no audio input device found")]
    DeviceNotFound,

    /// The device exists but could not be configured or read.
    #[error("audio device error: {0}")]
    Device(String),

    /// The recorder failed to initialize capture or its encoder.
    #[error("failed to start recording: {0}")]
    RecordingStart(String),

    /// The audio bytes handed to the trimmer could not be decoded.
    #[error("failed to decode audio: {0}")]
    Decode(String),
}

impl CaptureError {
    /// User-facing message for the host UI, keyed to the error kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => {
                "Microphone access was denied. Please allow microphone access and try again."
            }
            CaptureError::DeviceNotFound => {
                "No microphone was found. Please connect a microphone and try again."
            }
            CaptureError::Device(_) => {
                "Could not access the microphone. Please check your audio settings."
            }
            CaptureError::RecordingStart(_) => "Could not start recording. Please try again.",
            CaptureError::Decode(_) => {
                "Could not load this audio for trimming. The file may be damaged or unsupported."
            }
        }
    }
}
