// Integration tests for audio decoding.

mod common;

use common::sine_wav_bytes;
use voicebook_capture::{decode_blob, decode_file, encode_wav, CaptureError};

#[test]
fn test_decode_wav_blob_reports_rate_and_duration() {
    let bytes = sine_wav_bytes(2.0, 44_100);
    let decoded = decode_blob(&bytes).expect("wav decodes");

    assert_eq!(decoded.sample_rate, 44_100);
    assert_eq!(decoded.samples.len(), 2 * 44_100);
    assert!((decoded.duration_seconds - 2.0).abs() < 0.01);
    // Amplitudes normalized into [-1, 1]
    assert!(decoded.samples.iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn test_decode_keeps_only_the_first_channel() {
    // Interleaved stereo: left holds a constant positive value, right a
    // constant negative one
    let frames = 44_100;
    let mut samples = Vec::with_capacity(frames * 2);
    for _ in 0..frames {
        samples.push(8000i16);
        samples.push(-8000i16);
    }
    let bytes = encode_wav(&samples, 44_100, 2).expect("stereo wav encodes");

    let decoded = decode_blob(&bytes).expect("stereo wav decodes");

    assert_eq!(decoded.samples.len(), frames);
    assert!((decoded.duration_seconds - 1.0).abs() < 0.01);
    let left = 8000.0 / 32768.0;
    assert!(decoded
        .samples
        .iter()
        .all(|&s| (s - left).abs() < 1e-3), "right channel leaked in");
}

#[test]
fn test_decode_rejects_garbage_bytes() {
    let err = decode_blob(&[0x00, 0x01, 0x02, 0x03, 0x04]).expect_err("garbage");
    assert!(matches!(err, CaptureError::Decode(_)));
}

#[test]
fn test_decode_rejects_empty_input() {
    let err = decode_blob(&[]).expect_err("empty");
    assert!(matches!(err, CaptureError::Decode(_)));
}

#[test]
fn test_decode_file_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fixture.wav");
    std::fs::write(&path, sine_wav_bytes(1.0, 22_050)).expect("write fixture");

    let decoded = decode_file(&path).expect("file decodes");
    assert_eq!(decoded.sample_rate, 22_050);
    assert!((decoded.duration_seconds - 1.0).abs() < 0.01);
}

#[test]
fn test_decode_missing_file_is_a_decode_error() {
    let err = decode_file(std::path::Path::new("/nonexistent/audio.wav"))
        .expect_err("missing file");
    assert!(matches!(err, CaptureError::Decode(_)));
}
