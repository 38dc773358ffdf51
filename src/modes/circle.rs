//! Radial "spider web": one spoke per sampled bin around a swelling ring.

use std::f32::consts::TAU;

use glam::Vec2;

use super::FrameInput;
use crate::canvas::{Color, Frame};
use crate::params::CircleStyle;

pub fn draw_circle(input: &FrameInput<'_>, style: &CircleStyle, frame: &mut Frame) {
    let bins = input.spectrum;
    if bins.is_empty() {
        return;
    }

    let center = input.center();
    let width = style.line_width;

    let ring_radius = style.base_radius + input.loudness.average_unit() * style.ring_swell;
    let ring_hue = 200.0 + input.loudness.bass;
    frame.stroke_circle(center, ring_radius, Color::hsla(ring_hue, 1.0, 0.6, 0.5), width);

    for (i, &value) in bins.iter().enumerate().step_by(style.spoke_step.max(1)) {
        let angle = i as f32 / bins.len() as f32 * TAU;
        let start = Vec2::from_angle(angle) * style.base_radius;
        let end = start * (value as f32 / style.spoke_divisor);
        let hue = i as f32 + value as f32;

        frame.line(center + start, center + end, Color::hsl(hue, 1.0, 0.6), width);
    }
}
