//! Per-mode drawing parameters.
//!
//! Lengths are canvas pixels, angles radians, hues degrees. Per-frame
//! rates apply once per rendered frame at speed 1.0.

use serde::Deserialize;

/// Oscilloscope line
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaveStyle {
    /// Take every n-th time-domain sample as a vertex
    pub stride: usize,

    /// Extra vertical gain at full loudness (gain = 1 + average/255 * this)
    pub loudness_gain: f32,

    /// Line width (pixels)
    pub line_width: f32,

    /// Hue at silence (degrees, 185 ≈ #00f6ff)
    pub base_hue: f32,

    /// Hue shift at full bass (degrees)
    pub bass_hue_shift: f32,
}

impl Default for WaveStyle {
    fn default() -> Self {
        Self {
            stride: 1,
            loudness_gain: 0.5,
            line_width: 2.0,
            base_hue: 185.0,
            bass_hue_shift: 120.0,
        }
    }
}

/// Radial "spider web"
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircleStyle {
    /// Radius where spokes start (pixels)
    pub base_radius: f32,

    /// Draw one spoke every n frequency bins
    pub spoke_step: usize,

    /// Spoke end = start * value / this
    pub spoke_divisor: f32,

    /// Ring growth at full loudness (pixels)
    pub ring_swell: f32,

    /// Line width (pixels)
    pub line_width: f32,
}

impl Default for CircleStyle {
    fn default() -> Self {
        Self {
            base_radius: 80.0,
            spoke_step: 10,
            spoke_divisor: 80.0,
            ring_swell: 40.0,
            line_width: 1.0,
        }
    }
}

/// Scrolling ECG trace
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeartbeatStyle {
    /// Bass level that forces a spike (byte magnitude)
    pub spike_threshold: f32,

    /// Spike height at full bass (pixels)
    pub spike_height: f32,

    /// Average loudness that enables flutter (byte magnitude)
    pub flutter_threshold: f32,

    /// Flutter amplitude (pixels)
    pub flutter_amplitude: f32,

    /// Flutter noise frequency (noise units per second)
    pub flutter_rate: f64,

    /// Horizontal distance between trail entries (pixels)
    pub column_width: f32,

    /// Line width (pixels)
    pub line_width: f32,

    /// Perlin noise seed for flutter
    pub noise_seed: u32,
}

impl Default for HeartbeatStyle {
    fn default() -> Self {
        Self {
            spike_threshold: 170.0,
            spike_height: 60.0,
            flutter_threshold: 40.0,
            flutter_amplitude: 6.0,
            flutter_rate: 12.0,
            column_width: 1.0,
            line_width: 2.0,
            noise_seed: 42,
        }
    }
}

/// Starfield, orbiting dust and beat pulse
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GalaxyStyle {
    pub star_count: usize,

    /// Star radius range (pixels)
    pub star_radius: (f32, f32),

    /// Star fall speed range (pixels per frame)
    pub star_speed: (f32, f32),

    pub dust_count: usize,

    /// Dust orbit distance range from centre (pixels)
    pub dust_distance: (f32, f32),

    /// Dust angular speed range (radians per frame)
    pub dust_speed: (f32, f32),

    /// Dust radius at silence (pixels)
    pub dust_radius: f32,

    /// Extra dust radius at full bass (pixels)
    pub dust_swell: f32,

    /// Pulse ring radius at zero impulse (pixels)
    pub pulse_radius: f32,

    /// Pulse ring growth at full impulse (pixels)
    pub pulse_growth: f32,

    /// Impulse multiplier applied per frame
    pub pulse_decay: f32,

    /// Trail fade alpha painted over the previous frame
    pub fade_alpha: f32,

    /// Particle seed
    pub seed: u64,
}

impl Default for GalaxyStyle {
    fn default() -> Self {
        Self {
            star_count: 100,
            star_radius: (0.0, 1.5),
            star_speed: (0.2, 0.7),
            dust_count: 60,
            dust_distance: (100.0, 250.0),
            dust_speed: (0.001, 0.011),
            dust_radius: 2.0,
            dust_swell: 2.0,
            pulse_radius: 80.0,
            pulse_growth: 50.0,
            pulse_decay: 0.85,
            fade_alpha: 0.3,
            seed: 7,
        }
    }
}

/// How the sigma control behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigmaActivation {
    /// Each press flips the overlay on or off
    #[default]
    Toggle,

    /// First press enables the overlay for the rest of the run
    Latch,
}

/// Shake, flash and ring overlay
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SigmaStyle {
    pub activation: SigmaActivation,

    /// Shake magnitude set on beat (pixels, peak-to-peak)
    pub shake_magnitude: f32,

    /// Shake multiplier applied per frame
    pub shake_decay: f32,

    /// Shake below this is treated as zero (pixels)
    pub shake_cutoff: f32,

    /// Ring radius (pixels)
    pub ring_radius: f32,

    /// Ring wobble amplitude (pixels)
    pub ring_wobble: f32,

    /// Ring wobble angular frequency (radians per second)
    pub ring_wobble_rate: f32,

    /// Flash alpha set on beat
    pub flash_alpha: f32,

    /// Flash multiplier applied per frame
    pub flash_decay: f32,

    /// Rings drawn in sigma mode
    pub mode_rings: usize,

    /// Spacing between sigma mode rings (pixels)
    pub mode_ring_spacing: f32,

    /// Seed for shake jitter
    pub seed: u64,
}

impl Default for SigmaStyle {
    fn default() -> Self {
        Self {
            activation: SigmaActivation::Toggle,
            shake_magnitude: 8.0,
            shake_decay: 0.9,
            shake_cutoff: 0.05,
            ring_radius: 120.0,
            ring_wobble: 10.0,
            ring_wobble_rate: 10.0,
            flash_alpha: 0.35,
            flash_decay: 0.8,
            mode_rings: 3,
            mode_ring_spacing: 50.0,
            seed: 99,
        }
    }
}

/// All mode styles
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VisualStyle {
    pub wave: WaveStyle,
    pub circle: CircleStyle,
    pub heartbeat: HeartbeatStyle,
    pub galaxy: GalaxyStyle,
    pub sigma: SigmaStyle,
}
