// Integration tests for bounded selection playback.
//
// ScriptedSink's playhead follows the paused tokio clock, so these tests
// drive real wall-clock-free playback timelines.

mod common;

use common::{sine_wav_bytes, ScriptedSink};
use voicebook_capture::{play_bounded, AudioSource, PlaybackSink, TrimSelection, Trimmer, WaveformConfig};

#[tokio::test(start_paused = true)]
async fn test_bounded_selection_pauses_at_end_time() {
    let mut sink = ScriptedSink::new(10.0);
    let selection = TrimSelection {
        start_time: 2.0,
        end_time: 5.0,
        duration: 10.0,
    };

    play_bounded(selection, &mut sink).await;

    assert_eq!(sink.seek_positions, vec![2.0]);
    assert_eq!(sink.pause_count, 1);
    assert!(!sink.is_playing());
    // Paused at the bound, within one polling frame
    let position = sink.position_secs();
    assert!(position >= 5.0 && position < 5.1, "position {position}");
}

#[tokio::test(start_paused = true)]
async fn test_selection_touching_the_end_plays_to_completion() {
    let mut sink = ScriptedSink::new(10.0);
    let selection = TrimSelection {
        start_time: 8.0,
        end_time: 10.0,
        duration: 10.0,
    };

    play_bounded(selection, &mut sink).await;

    // No explicit pause: the source ran out on its own
    assert_eq!(sink.pause_count, 0);
    assert!(sink.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_full_range_selection_plays_whole_clip() {
    let mut sink = ScriptedSink::new(3.0);

    play_bounded(TrimSelection::full(3.0), &mut sink).await;

    assert_eq!(sink.seek_positions, vec![0.0]);
    assert_eq!(sink.pause_count, 0);
    assert!(sink.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_zero_width_selection_pauses_immediately() {
    let mut sink = ScriptedSink::new(10.0);
    let selection = TrimSelection {
        start_time: 4.0,
        end_time: 4.0,
        duration: 10.0,
    };

    play_bounded(selection, &mut sink).await;

    assert_eq!(sink.pause_count, 1);
    let position = sink.position_secs();
    assert!(position >= 4.0 && position < 4.1, "position {position}");
}

#[tokio::test(start_paused = true)]
async fn test_trimmer_plays_its_current_selection() {
    let mut trimmer = Trimmer::new(WaveformConfig::default());
    trimmer
        .load_audio(AudioSource::Bytes(sine_wav_bytes(10.0, 44_100)))
        .expect("fixture decodes");
    trimmer.set_start_time(1.0);
    trimmer.set_end_time(3.0);

    let mut sink = ScriptedSink::new(trimmer.duration().unwrap());
    assert!(trimmer.play_selection(&mut sink).await);

    assert_eq!(sink.seek_positions, vec![1.0]);
    assert_eq!(sink.pause_count, 1);
}

#[tokio::test]
async fn test_empty_trimmer_refuses_playback() {
    let trimmer = Trimmer::new(WaveformConfig::default());
    let mut sink = ScriptedSink::new(1.0);

    assert!(!trimmer.play_selection(&mut sink).await);
    assert!(sink.seek_positions.is_empty());
}
