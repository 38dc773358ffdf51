//! Beat trigger with adaptive threshold and cooldown.
//!
//! Fires a one-shot [`BeatEvent`] when the level crosses the current
//! threshold and the cooldown has elapsed. Firing lifts the threshold to
//! the triggering level so a sustained loud passage cannot re-fire; every
//! evaluation then eases it back toward recent loudness, never below the
//! configured floor.

use tracing::trace;

use crate::params::BeatConfig;

/// A detected beat
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatEvent {
    /// Time of detection (seconds)
    pub at_s: f64,
    /// Level that triggered it (byte magnitude)
    pub level: f32,
}

/// Adaptive-threshold beat detector
#[derive(Debug, Clone)]
pub struct BeatDetector {
    config: BeatConfig,
    threshold: f32,
    recent: f32,
    last_beat_s: Option<f64>,
    speed: f32,
}

impl BeatDetector {
    pub fn new(config: BeatConfig) -> Self {
        Self {
            threshold: config.threshold_floor,
            recent: 0.0,
            last_beat_s: None,
            speed: 1.0,
            config,
        }
    }

    /// Current threshold (byte magnitude)
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn config(&self) -> &BeatConfig {
        &self.config
    }

    /// Scale the cooldown: faster speed means shorter cooldown
    pub fn set_speed(&mut self, speed: f32) {
        if speed > 0.0 {
            self.speed = speed;
        }
    }

    /// Effective cooldown (seconds)
    pub fn cooldown_s(&self) -> f64 {
        self.config.cooldown_ms / 1000.0 / self.speed as f64
    }

    /// Evaluate one frame's level at `now_s`
    pub fn process(&mut self, level: f32, now_s: f64) -> Option<BeatEvent> {
        let level = if level.is_finite() { level } else { 0.0 };

        let cooled = match self.last_beat_s {
            Some(last) => now_s - last >= self.cooldown_s(),
            None => true,
        };

        let beat = if level > self.threshold && cooled {
            self.last_beat_s = Some(now_s);
            self.threshold = level;
            trace!("beat at {:.3}s (level {:.1})", now_s, level);
            Some(BeatEvent { at_s: now_s, level })
        } else {
            None
        };

        let weight = self.config.average_weight;
        self.recent = self.recent * (1.0 - weight) + level * weight;
        self.threshold += (self.recent - self.threshold) * self.config.adapt_rate;
        self.threshold = self.threshold.max(self.config.threshold_floor);

        beat
    }

    /// Forget all history (new audio session)
    pub fn reset(&mut self) {
        self.threshold = self.config.threshold_floor;
        self.recent = 0.0;
        self.last_beat_s = None;
    }
}
