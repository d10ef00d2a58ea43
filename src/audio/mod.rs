pub mod backend;
pub mod cpal_backend;
pub mod decode;
pub mod format;

pub use backend::{CaptureBackend, CaptureBackendConfig, CaptureBackendFactory, CaptureChunk};
pub use cpal_backend::CpalBackend;
pub use decode::{decode_blob, decode_file, DecodedAudio};
pub use format::{encode_wav, negotiate, AudioBlob, EncodingFormat, Negotiated, DEFAULT_MIME_TYPE};
