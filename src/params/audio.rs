//! Audio analysis and beat detection configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Spectrum analyser configuration (mirrors a browser analyser node)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// Analysis window size in samples (power of 2, 32..=32768)
    pub fft_size: usize,

    /// Temporal smoothing of bin magnitudes (0 = none, <1)
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins (half the window)
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(ConfigError::Invalid(format!(
                "fft_size must be a power of 2 in 32..=32768, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(ConfigError::Invalid(format!(
                "smoothing_time_constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(ConfigError::Invalid(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Beat trigger parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// Number of lowest frequency bins averaged into the bass metric
    /// 30 bins @ 512-point FFT, 44.1kHz ≈ 0-2.6 kHz
    pub bass_bins: usize,

    /// Lowest value the adaptive threshold may reach (byte magnitude, 0-255)
    pub threshold_floor: f32,

    /// Minimum time between beats at speed 1.0 (milliseconds)
    pub cooldown_ms: f64,

    /// Fraction of the gap to recent loudness closed per evaluation (0-1)
    pub adapt_rate: f32,

    /// Weight of the newest value in the recent-loudness average (0-1)
    pub average_weight: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            bass_bins: 30,
            threshold_floor: 180.0,
            cooldown_ms: 200.0,
            adapt_rate: 0.05,
            average_weight: 0.1,
        }
    }
}

impl BeatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bass_bins == 0 {
            return Err(ConfigError::Invalid("bass_bins must be > 0".to_string()));
        }
        if !(0.0..=255.0).contains(&self.threshold_floor) {
            return Err(ConfigError::Invalid(format!(
                "threshold_floor must be within 0-255, got {}",
                self.threshold_floor
            )));
        }
        if !(self.cooldown_ms >= 0.0 && self.cooldown_ms.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "cooldown_ms must be a finite value >= 0, got {}",
                self.cooldown_ms
            )));
        }
        for (name, value) in [
            ("adapt_rate", self.adapt_rate),
            ("average_weight", self.average_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0-1, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Audio constants
pub mod audio_constants {
    /// Ring capacity for incrementally decoded tracks (interleaved samples)
    /// 2^17 ≈ 1.5s of stereo @ 44.1kHz
    pub const STREAM_BUFFER_SAMPLES: usize = 1 << 17;

    /// Decoder thread back-off when the ring is full (milliseconds)
    pub const STREAM_BACKOFF_MS: u64 = 5;
}
