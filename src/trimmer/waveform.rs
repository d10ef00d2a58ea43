//! Min/max waveform summarization and rendering geometry.
//!
//! Samples are partitioned into one bucket per pixel column; each column keeps
//! the bucket's min and max amplitude so peaks stay visible at any width
//! without rendering every sample. Drawing itself goes through the
//! [`WaveformCanvas`] adapter, keeping the platform canvas out of the core.

use tracing::debug;

use crate::trimmer::TrimSelection;

/// Min/max amplitude pair for one pixel column, in [-1.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnPeak {
    pub min: f32,
    pub max: f32,
}

impl ColumnPeak {
    const SILENT: ColumnPeak = ColumnPeak { min: 0.0, max: 0.0 };
}

/// Summarize the first audio channel into `width` min/max columns.
///
/// Bucket size is `ceil(sample_count / width)`; trailing columns past the end
/// of the samples come out silent.
pub fn compute_peaks(samples: &[f32], width: usize) -> Vec<ColumnPeak> {
    if width == 0 {
        return Vec::new();
    }
    if samples.is_empty() {
        return vec![ColumnPeak::SILENT; width];
    }

    let step = samples.len().div_ceil(width);
    debug!(
        "Computing waveform peaks: {} samples into {} columns (step {})",
        samples.len(),
        width,
        step
    );

    (0..width)
        .map(|column| {
            let start = column * step;
            if start >= samples.len() {
                return ColumnPeak::SILENT;
            }
            let end = (start + step).min(samples.len());

            let mut peak = ColumnPeak {
                min: f32::INFINITY,
                max: f32::NEG_INFINITY,
            };
            for &sample in &samples[start..end] {
                if sample < peak.min {
                    peak.min = sample;
                }
                if sample > peak.max {
                    peak.max = sample;
                }
            }
            peak
        })
        .collect()
}

/// Thin drawing adapter implemented by the host (canvas, terminal, ...).
pub trait WaveformCanvas {
    /// Draw a vertical bar for column `x` spanning `y_lower..y_upper` pixels.
    fn draw_bar(&mut self, x: usize, y_lower: f32, y_upper: f32);

    /// Draw the horizontal zero-amplitude reference line at `y`.
    fn draw_center_line(&mut self, y: f32);
}

/// Draw the peak columns onto a canvas of the given pixel height.
///
/// Amplitude `a` maps to the vertical position `(1 + a) / 2 * height`, so a
/// column's bar spans the vertically-centered min..max range.
pub fn render(peaks: &[ColumnPeak], height: f32, canvas: &mut dyn WaveformCanvas) {
    for (x, peak) in peaks.iter().enumerate() {
        let y_lower = (1.0 + peak.min) / 2.0 * height;
        let y_upper = (1.0 + peak.max) / 2.0 * height;
        canvas.draw_bar(x, y_lower, y_upper);
    }
    canvas.draw_center_line(height / 2.0);
}

/// Selection rectangle over the waveform, in percent of the canvas width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionOverlay {
    pub left_pct: f64,
    pub width_pct: f64,
}

impl SelectionOverlay {
    pub fn from_selection(selection: &TrimSelection) -> Self {
        if selection.duration <= 0.0 {
            return Self {
                left_pct: 0.0,
                width_pct: 0.0,
            };
        }
        Self {
            left_pct: selection.start_time / selection.duration * 100.0,
            width_pct: (selection.end_time - selection.start_time) / selection.duration * 100.0,
        }
    }
}
