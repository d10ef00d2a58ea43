use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use voicebook_capture::{
    compute_peaks, decode_file, format_elapsed, AudioSource, CaptureBackendConfig,
    CaptureBackendFactory, CaptureController, Config, RecorderEvent, RodioSink, TrimmerKind,
    WaveformCanvas,
};

#[derive(Parser)]
#[command(name = "voicebook-capture", about = "Record, inspect and trim word recordings")]
struct Cli {
    /// Config file (TOML, without extension)
    #[arg(long, default_value = "config/voicebook")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record from the microphone until Ctrl-C or the 60s ceiling
    Record {
        /// Where to write the recorded audio
        output: PathBuf,
    },
    /// Print an ASCII waveform of an audio file
    Waveform {
        input: PathBuf,
        #[arg(long, default_value_t = 80)]
        width: usize,
        #[arg(long, default_value_t = 16)]
        height: usize,
    },
    /// Select a sub-range of an audio file and print the save payload
    Trim {
        input: PathBuf,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        /// Play the selection through the default output device
        #[arg(long)]
        play: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Record { output } => record(config, output).await,
        Command::Waveform {
            input,
            width,
            height,
        } => waveform(input, width, height),
        Command::Trim {
            input,
            start,
            end,
            play,
        } => trim(config, input, start, end, play).await,
    }
}

async fn record(config: Config, output: PathBuf) -> Result<()> {
    let backend_config = CaptureBackendConfig::from_audio_config(
        &config.audio,
        config.recording.chunk_interval_ms,
    );
    let backend = CaptureBackendFactory::create(backend_config);

    let mut controller = CaptureController::new(config);
    let mut events = controller.open_recorder(backend).await;

    let recorder = controller.recorder().context("recorder missing")?;
    if !recorder.request_permission().await {
        bail!("Microphone permission was not granted");
    }
    if !recorder.start_recording().await {
        bail!("Recording could not be started");
    }
    println!("Recording... press Ctrl-C to stop");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(RecorderEvent::Tick { elapsed_secs, level, .. }) => {
                    println!("  {} [{:?}]", format_elapsed(elapsed_secs), level);
                }
                Some(RecorderEvent::Error { message }) => println!("! {}", message),
                Some(RecorderEvent::AutoStopped) => {
                    println!("Reached the 60 second limit, recording stopped automatically.");
                }
                Some(RecorderEvent::Stopped { duration_secs }) => {
                    println!("Stopped after {:.1}s", duration_secs);
                    break;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                if let Some(recorder) = controller.recorder() {
                    recorder.stop_recording().await;
                }
            }
        }
    }

    let blob = controller
        .recorder()
        .and_then(|r| r.recorded_blob())
        .context("no recording was produced")?;
    std::fs::write(&output, &blob.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Saved {} bytes ({}) to {}",
        blob.len(),
        blob.mime_type,
        output.display()
    );

    controller.dispose().await;
    Ok(())
}

fn waveform(input: PathBuf, width: usize, height: usize) -> Result<()> {
    let audio = decode_file(&input)?;
    let peaks = compute_peaks(&audio.samples, width);

    let mut canvas = TextCanvas::new(width, height);
    voicebook_capture::trimmer::render(&peaks, height as f32, &mut canvas);
    print!("{}", canvas.into_string());

    println!(
        "{}: {:.2}s @ {}Hz",
        input.display(),
        audio.duration_seconds,
        audio.sample_rate
    );
    Ok(())
}

async fn trim(config: Config, input: PathBuf, start: f64, end: f64, play: bool) -> Result<()> {
    let mut controller = CaptureController::new(config);

    let trimmer = controller.trimmer_mut(TrimmerKind::Upload);
    trimmer
        .load_audio(AudioSource::File(input.clone()))
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;
    trimmer.set_start_time(start);
    trimmer.set_end_time(end);

    let selection = trimmer.selection().context("no selection")?;
    println!("selection: {}", serde_json::to_string_pretty(&selection)?);
    if selection.is_full_audio() {
        println!("full audio selected: no trim metadata would be sent");
    }

    if play {
        let bytes = std::fs::read(&input)?;
        let mut sink = RodioSink::from_bytes(bytes)?;
        controller
            .trimmer(TrimmerKind::Upload)
            .play_selection(&mut sink)
            .await;
    }

    controller.dispose().await;
    Ok(())
}

/// Terminal waveform adapter: rows of block characters, loudest at the top.
struct TextCanvas {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    center_row: Option<usize>,
}

impl TextCanvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
            center_row: None,
        }
    }

    fn into_string(self) -> String {
        let mut out = String::new();
        // Row 0 of the grid is amplitude -1.0; print top-down
        for row in (0..self.height).rev() {
            for col in 0..self.width {
                if self.cells[row * self.width + col] {
                    out.push('█');
                } else if self.center_row == Some(row) {
                    out.push('─');
                } else {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }
}

impl WaveformCanvas for TextCanvas {
    fn draw_bar(&mut self, x: usize, y_lower: f32, y_upper: f32) {
        if x >= self.width {
            return;
        }
        let lower = y_lower.floor().max(0.0) as usize;
        let upper = (y_upper.ceil() as usize).min(self.height.saturating_sub(1));
        for row in lower..=upper {
            self.cells[row * self.width + x] = true;
        }
    }

    fn draw_center_line(&mut self, y: f32) {
        let row = (y as usize).min(self.height.saturating_sub(1));
        self.center_row = Some(row);
    }
}
