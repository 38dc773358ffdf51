//! Window, control and recording configuration.

use serde::Deserialize;

/// Rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    /// 400 = the classic strip-visualizer height
    pub window_height: u32,

    /// Segments used to approximate a full circle
    pub circle_segments: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 400,
            circle_segments: 48,
        }
    }
}

/// Bounds for user-adjustable controls
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Initial animation speed multiplier
    pub speed: f32,

    /// Slowest allowed speed
    pub min_speed: f32,

    /// Fastest allowed speed
    pub max_speed: f32,

    /// Change per speed key press
    pub speed_step: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            min_speed: 0.1,
            max_speed: 3.0,
            speed_step: 0.1,
        }
    }
}

impl ControlConfig {
    /// Clamp a requested speed into the allowed range (NaN falls back to the initial speed)
    pub fn clamp_speed(&self, speed: f32) -> f32 {
        if speed.is_nan() {
            return self.speed.clamp(self.min_speed, self.max_speed);
        }
        speed.clamp(self.min_speed, self.max_speed)
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Fixed timestep for frame `n` (seconds)
    pub fn frame_time(&self, frame_num: usize) -> f64 {
        frame_num as f64 / self.fps as f64
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Audio file path
    pub fn audio_path(&self) -> String {
        format!("{}/audio.wav", self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_clamped() {
        let controls = ControlConfig::default();
        assert_eq!(controls.clamp_speed(10.0), 3.0);
        assert_eq!(controls.clamp_speed(0.0), 0.1);
        assert_eq!(controls.clamp_speed(1.5), 1.5);
        assert_eq!(controls.clamp_speed(f32::NAN), 1.0);
    }

    #[test]
    fn test_recording_frames() {
        let config = RecordingConfig::new(2.5);
        assert_eq!(config.total_frames(), 150);
        assert_eq!(config.frame_time(60), 1.0);
        assert_eq!(config.frames_dir(), "recording/frames");
    }
}
