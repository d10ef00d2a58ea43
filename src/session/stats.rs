use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of a capture session for the host UI
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Whether the recorder is currently capturing
    pub is_recording: bool,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Seconds recorded so far in the active recording
    pub elapsed_secs: u64,

    /// Whether a finished blob is ready for trimming/saving
    pub has_recorded_blob: bool,
}
