//! ECG-style trace scrolling right to left.

use std::collections::VecDeque;

use glam::Vec2;
use noise::{NoiseFn, Perlin};

use super::FrameInput;
use crate::canvas::{Color, Frame};
use crate::params::HeartbeatStyle;

/// Fixed-capacity FIFO of vertical offsets; the oldest entry drops first
#[derive(Debug, Clone)]
pub struct Trail {
    offsets: VecDeque<f32>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            offsets: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, offset: f32) {
        if self.capacity == 0 {
            return;
        }
        while self.offsets.len() >= self.capacity {
            self.offsets.pop_front();
        }
        self.offsets.push_back(offset);
    }

    /// Change the bound, dropping the oldest entries if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.offsets.len() > capacity {
            self.offsets.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.offsets.iter().copied()
    }
}

/// Offset class chosen each frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Baseline,
    Flutter,
    Spike,
}

/// Heartbeat mode state
#[derive(Debug)]
pub struct HeartbeatState {
    pub trail: Trail,
    perlin: Perlin,
    spike_up: bool,
}

impl HeartbeatState {
    pub fn new(style: &HeartbeatStyle) -> Self {
        Self {
            trail: Trail::new(0),
            perlin: Perlin::new(style.noise_seed),
            spike_up: true,
        }
    }

    /// Classify the current frame
    pub fn tier(input: &FrameInput<'_>, style: &HeartbeatStyle) -> Tier {
        if input.beat.is_some() || input.loudness.bass >= style.spike_threshold {
            Tier::Spike
        } else if input.loudness.average >= style.flutter_threshold {
            Tier::Flutter
        } else {
            Tier::Baseline
        }
    }

    /// Append this frame's offset (pixels, negative is up)
    pub fn advance(&mut self, input: &FrameInput<'_>, style: &HeartbeatStyle) -> Tier {
        let columns = (input.size.x / style.column_width).floor().max(0.0) as usize;
        self.trail.set_capacity(columns);

        let tier = Self::tier(input, style);
        let offset = match tier {
            Tier::Spike => {
                let sign = if self.spike_up { -1.0 } else { 1.0 };
                self.spike_up = !self.spike_up;
                sign * style.spike_height * input.loudness.bass_unit().max(0.25)
            }
            Tier::Flutter => {
                let t = input.elapsed_s * style.flutter_rate;
                self.perlin.get([t, 0.5]) as f32 * style.flutter_amplitude
            }
            Tier::Baseline => 0.0,
        };
        self.trail.push(offset);
        tier
    }

    pub fn draw(&mut self, input: &FrameInput<'_>, style: &HeartbeatStyle, frame: &mut Frame) {
        self.advance(input, style);

        let mid = input.size.y / 2.0;
        let right = input.size.x;
        let newest = self.trail.len().saturating_sub(1);
        let points: Vec<Vec2> = self
            .trail
            .iter()
            .enumerate()
            .map(|(k, offset)| {
                let age = (newest - k) as f32;
                Vec2::new(right - age * style.column_width, mid + offset)
            })
            .collect();

        frame.polyline(points, Color::rgba8(0x00, 0xff, 0x66, 1.0), style.line_width);
    }
}
