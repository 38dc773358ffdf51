//! Oscilloscope line across the canvas width.

use glam::Vec2;

use super::FrameInput;
use crate::canvas::{Color, Frame};
use crate::params::WaveStyle;

/// Silent midpoint of byte waveform samples
const MIDPOINT: f32 = 128.0;

/// Vertices of the wave line, or `None` when the buffer is too short
pub fn wave_points(input: &FrameInput<'_>, style: &WaveStyle) -> Option<Vec<Vec2>> {
    let samples = input.waveform;
    let stride = style.stride.max(1);
    let count = samples.len().div_ceil(stride);
    if count < 2 {
        return None;
    }

    let width = input.size.x;
    let height = input.size.y;
    let mid = height / 2.0;
    let gain = 1.0 + input.loudness.average_unit() * style.loudness_gain;
    let step = width / (count - 1) as f32;

    let points = samples
        .iter()
        .step_by(stride)
        .enumerate()
        .map(|(i, &v)| {
            let deviation = (v as f32 - MIDPOINT) / MIDPOINT;
            let y = (mid - deviation * mid * gain).clamp(0.0, height);
            Vec2::new(i as f32 * step, y)
        })
        .collect();

    Some(points)
}

/// Draw the waveform as one polyline
pub fn draw_wave(input: &FrameInput<'_>, style: &WaveStyle, frame: &mut Frame) {
    let Some(points) = wave_points(input, style) else {
        return;
    };

    let hue = style.base_hue + input.loudness.bass_unit() * style.bass_hue_shift;
    frame.polyline(points, Color::hsl(hue, 1.0, 0.5), style.line_width);
}
