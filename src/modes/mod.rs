//! Mode drawing routines and their persistent state.
//!
//! Each routine turns one frame's samples plus its own state into draw
//! commands. States never touch each other; only the loudness metric and
//! beat event are shared.

mod circle;
mod galaxy;
mod heartbeat;
mod sigma;
mod wave;

use std::fmt;
use std::str::FromStr;

use glam::Vec2;

pub use circle::draw_circle;
pub use galaxy::{Dust, GalaxyState, Star};
pub use heartbeat::{HeartbeatState, Tier, Trail};
pub use sigma::SigmaState;
pub use wave::draw_wave;

use crate::beat::BeatEvent;
use crate::canvas::{Background, Frame};
use crate::metric::Loudness;
use crate::params::VisualStyle;

/// Active visualisation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    #[default]
    Wave,
    Circle,
    Heartbeat,
    Galaxy,
    Sigma,
}

impl RenderMode {
    pub const ALL: [RenderMode; 5] = [
        RenderMode::Wave,
        RenderMode::Circle,
        RenderMode::Heartbeat,
        RenderMode::Galaxy,
        RenderMode::Sigma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Wave => "wave",
            RenderMode::Circle => "circle",
            RenderMode::Heartbeat => "heartbeat",
            RenderMode::Galaxy => "galaxy",
            RenderMode::Sigma => "sigma",
        }
    }

    /// Background operation this mode starts each frame with
    pub fn background(self, style: &VisualStyle) -> Background {
        match self {
            RenderMode::Galaxy => Background::Fade(crate::canvas::Color::rgba8(
                5,
                5,
                20,
                style.galaxy.fade_alpha,
            )),
            _ => Background::default(),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown mode name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected wave, circle, heartbeat, galaxy or sigma)")]
pub struct UnknownMode(pub String);

impl FromStr for RenderMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RenderMode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Inputs shared by every routine for one frame
#[derive(Clone, Copy, Debug)]
pub struct FrameInput<'a> {
    /// Byte frequency magnitudes
    pub spectrum: &'a [u8],
    /// Byte waveform samples (128 = silence)
    pub waveform: &'a [u8],
    pub loudness: Loudness,
    /// Beat detected this frame
    pub beat: Option<BeatEvent>,
    /// Seconds since the renderer started
    pub elapsed_s: f64,
    /// Canvas size (pixels)
    pub size: Vec2,
    /// User speed multiplier
    pub speed: f32,
}

impl FrameInput<'_> {
    pub fn center(&self) -> Vec2 {
        self.size * 0.5
    }
}

/// Persistent state of every mode
#[derive(Debug)]
pub struct ModeStates {
    pub heartbeat: HeartbeatState,
    pub galaxy: GalaxyState,
    pub sigma: SigmaState,
}

impl ModeStates {
    pub fn new(style: &VisualStyle) -> Self {
        Self {
            heartbeat: HeartbeatState::new(&style.heartbeat),
            galaxy: GalaxyState::new(&style.galaxy),
            sigma: SigmaState::new(&style.sigma),
        }
    }

    /// React to a beat regardless of which mode is showing
    pub fn on_beat(&mut self, sigma_active: bool, style: &VisualStyle) {
        self.galaxy.on_beat();
        if sigma_active {
            self.sigma.on_beat(&style.sigma);
        }
    }

    /// Draw `mode` into `frame`
    pub fn draw(
        &mut self,
        mode: RenderMode,
        input: &FrameInput<'_>,
        style: &VisualStyle,
        frame: &mut Frame,
    ) {
        match mode {
            RenderMode::Wave => draw_wave(input, &style.wave, frame),
            RenderMode::Circle => draw_circle(input, &style.circle, frame),
            RenderMode::Heartbeat => self.heartbeat.draw(input, &style.heartbeat, frame),
            RenderMode::Galaxy => self.galaxy.draw(input, &style.galaxy, frame),
            RenderMode::Sigma => self.sigma.draw_rings(input, &style.sigma, frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("wave".parse::<RenderMode>(), Ok(RenderMode::Wave));
        assert_eq!(" Galaxy ".parse::<RenderMode>(), Ok(RenderMode::Galaxy));
        assert!("spiral".parse::<RenderMode>().is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for mode in RenderMode::ALL {
            assert_eq!(mode.to_string().parse::<RenderMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_only_galaxy_fades() {
        let style = VisualStyle::default();
        for mode in RenderMode::ALL {
            let fades = matches!(mode.background(&style), Background::Fade(_));
            assert_eq!(fades, mode == RenderMode::Galaxy);
        }
    }
}
