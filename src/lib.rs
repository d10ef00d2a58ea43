pub mod audio;
pub mod config;
pub mod error;
pub mod recorder;
pub mod session;
pub mod trimmer;

pub use audio::{
    decode_blob, decode_file, encode_wav, negotiate, AudioBlob, CaptureBackend,
    CaptureBackendConfig, CaptureBackendFactory, CaptureChunk, CpalBackend, DecodedAudio,
    EncodingFormat, Negotiated, DEFAULT_MIME_TYPE,
};
pub use config::{AudioConfig, Config, RecordingConfig, WaveformConfig};
pub use error::CaptureError;
pub use recorder::{format_elapsed, ProgressLevel, Recorder, RecorderEvent, RecorderState};
pub use session::{CaptureController, SavePayload, SessionStats, TrimBounds, TrimmerKind};
pub use trimmer::{
    compute_peaks, play_bounded, AudioSource, ColumnPeak, PlaybackSink, RodioSink,
    SelectionOverlay, TrimSelection, Trimmer, TrimmerState, WaveformCanvas,
};
