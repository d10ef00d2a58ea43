use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub waveform: WaveformConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Target capture sample rate (device rate may differ)
    pub sample_rate: u32,
    pub channels: u16,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            echo_cancellation: true,
            noise_suppression: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Hard ceiling on recording length; exceeding it auto-stops the recorder
    pub max_duration_secs: u64,
    /// How often the backend must emit a captured chunk (at most 1000ms)
    pub chunk_interval_ms: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 60,
            chunk_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Pixel width of the waveform canvas (one min/max column per pixel)
    pub width: u32,
    /// Pixel height of the waveform canvas
    pub height: u32,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 200,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file is absent.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.audio.sample_rate, 44_100);
        assert!(cfg.audio.echo_cancellation);
        assert!(cfg.audio.noise_suppression);
        assert_eq!(cfg.recording.max_duration_secs, 60);
        assert_eq!(cfg.recording.chunk_interval_ms, 1000);
        assert_eq!(cfg.waveform.width, 800);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = Config::load("/nonexistent/voicebook").expect("defaults");
        assert_eq!(cfg.recording.max_duration_secs, 60);
    }
}
